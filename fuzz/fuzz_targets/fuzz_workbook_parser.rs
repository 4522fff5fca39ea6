//! Fuzz target for JSON workbook parsing.
//!
//! Goal: The parser should **never panic** on any input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_workbook_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = bastion_audit_workbook::fuzz::parse_json_workbook(data);
});
