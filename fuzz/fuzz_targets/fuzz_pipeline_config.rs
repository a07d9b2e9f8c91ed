//! Fuzz target for pipeline configuration parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rota_config::{validate_pipeline, PipelineConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<PipelineConfig>(data) {
        let _ = validate_pipeline(&config);
    }
});
