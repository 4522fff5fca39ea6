//! Numeric IPv4 containment.
//!
//! Malformed addresses are policy-irrelevant: every test on them is `false`.

/// Dotted quad -> `(((o1*256+o2)*256+o3)*256+o4)`. `None` unless exactly four
/// decimal octets in `0..=255`.
pub fn ip_to_u32(ip: &str) -> Option<u32> {
    let mut value: u32 = 0;
    let mut octets = 0;
    for part in ip.trim().split('.') {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u8 = part.parse().ok()?;
        value = (value << 8) | u32::from(octet);
        octets += 1;
    }
    (octets == 4).then_some(value)
}

/// Whether `ip` lies in the inclusive range `[start, end]`.
pub fn in_range(ip: &str, start: &str, end: &str) -> bool {
    match (ip_to_u32(ip), ip_to_u32(start), ip_to_u32(end)) {
        (Some(ip), Some(start), Some(end)) => start <= ip && ip <= end,
        _ => false,
    }
}
