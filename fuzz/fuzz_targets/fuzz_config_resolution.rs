//! Fuzz target for config parsing and policy resolution.
//!
//! Goal: arbitrary TOML must either resolve or error, **never panic**.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_resolution
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(cfg) = bastion_audit_settings::parse_config_toml(text) {
        let _ = bastion_audit_settings::resolve_config(cfg, Default::default());
    }
});
