#![no_main]

use libfuzzer_sys::fuzz_target;
use winhotkeys::ManagerConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(json_str) = std::str::from_utf8(data) {
        if let Ok(config) = ManagerConfig::from_json_str(json_str) {
            assert!(config.relay_capacity > 0);
        }
    }
});
