//! Fuzz target for schedule snapshots.
//!
//! Any snapshot that parses must produce a bundle without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rota_config::SchedulingRules;
use rota_core::recommend::{RecommendationEngine, ScheduleSnapshot};

fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = serde_json::from_slice::<ScheduleSnapshot>(data) else {
        return;
    };
    let _ = RecommendationEngine::default().generate(&snapshot, &SchedulingRules::default());
});
