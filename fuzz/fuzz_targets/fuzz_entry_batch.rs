//! Fuzz target for anomaly detection over schedule entry batches.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rota_common::ScheduleEntry;
use rota_core::anomaly::AnomalyDetector;

fuzz_target!(|data: &[u8]| {
    let Ok(entries) = serde_json::from_slice::<Vec<ScheduleEntry>>(data) else {
        return;
    };
    // Errors are fine; panics are not.
    let _ = AnomalyDetector::default().detect(&entries);
});
