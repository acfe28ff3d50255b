//! Fuzz target for configuration parsing.
//!
//! Arbitrary YAML must produce either a validated config or a Config error.

#![no_main]

use bolt_monitor::{AgentError, MonitorConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    match MonitorConfig::from_yaml(data) {
        Ok(config) => {
            assert!(!config.key_path().is_empty());
            assert!(!config.endpoints().is_empty());
        }
        Err(AgentError::Config(_)) => {}
        Err(other) => panic!("unexpected error kind: {:?}", other),
    }
});
