//! Fuzz target for IPv4 parsing and inclusive range checks.
//!
//! Goal: never panic, and agree with manual bounds on every parsed input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_ip_range
//! ```

#![no_main]

use arbitrary::Arbitrary;
use bastion_audit_domain::checks::{in_range, ip_to_u32};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct RangeInput {
    ip: String,
    start: String,
    end: String,
}

fuzz_target!(|input: RangeInput| {
    if input.ip.len() > 64 || input.start.len() > 64 || input.end.len() > 64 {
        return;
    }

    let hit = in_range(&input.ip, &input.start, &input.end);
    match (ip_to_u32(&input.ip), ip_to_u32(&input.start), ip_to_u32(&input.end)) {
        (Some(ip), Some(start), Some(end)) => assert_eq!(hit, start <= ip && ip <= end),
        _ => assert!(!hit),
    }
});
