//! MAC address normalization and validation.
//!
//! # Responsibilities
//! - Canonicalize raw identities into 12 lowercase hex characters
//! - Validate the canonical form exactly (no length tolerance)
//! - Render canonical addresses for display
//!
//! # Design Decisions
//! - Pure functions, total over all inputs: bad input yields `false` or an
//!   empty string, never an error
//! - Delimiters `:`, `-`, and `.` are stripped so `AA:BB-CC.DD:EE:FF` and
//!   `aabbccddeeff` canonicalize identically
//! - Display formatting refuses invalid input rather than dressing it up

/// Canonicalize a raw identity: lowercase, then strip `:`, `-`, and `.`.
///
/// No other transformation is applied; in particular the result is not
/// truncated or padded, so validation still catches bad lengths.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect()
}

/// Whether a normalized identity is exactly 12 lowercase hex characters.
pub fn is_valid_format(mac: &str) -> bool {
    mac.len() == 12 && mac.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Render a canonical address as colon-separated uppercase pairs.
///
/// Returns an empty string unless the input already passes
/// [`is_valid_format`], so an invalid address can never be mistaken for a
/// valid one in operator-facing output.
pub fn pretty(mac: &str) -> String {
    if !is_valid_format(mac) {
        return String::new();
    }

    let upper = mac.to_uppercase();
    let mut out = String::with_capacity(17);
    for (i, pair) in upper.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push(pair[0] as char);
        out.push(pair[1] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_delimiters_and_case() {
        assert_eq!(normalize("AA:BB:CC:DD:EE:FF"), "aabbccddeeff");
        assert_eq!(normalize("AA-BB-CC-DD-EE-FF"), "aabbccddeeff");
        assert_eq!(normalize("aabb.ccdd.eeff"), "aabbccddeeff");
        assert_eq!(normalize("AA:BB-CC.DD:EE:FF"), "aabbccddeeff");
        assert_eq!(normalize("aabbccddeeff"), "aabbccddeeff");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["AA:BB:CC:DD:EE:FF", "not-a-mac", "", "aabbccddeeff", "1.2.3"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn normalize_never_truncates() {
        assert_eq!(normalize("AA:BB:CC:DD:EE:FF:00"), "aabbccddeeff00");
        assert_eq!(normalize("zz"), "zz");
    }

    #[test]
    fn valid_format_requires_exactly_twelve_hex_chars() {
        assert!(is_valid_format("aabbccddeeff"));
        assert!(is_valid_format("001122334455"));
        assert!(!is_valid_format("aabbccddee"));
        assert!(!is_valid_format("aabbccddeeff00"));
        assert!(!is_valid_format("aabbccddeeg f"));
        assert!(!is_valid_format("AABBCCDDEEFF")); // uppercase is not canonical
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("not-a-mac"));
    }

    #[test]
    fn pretty_prints_valid_addresses() {
        assert_eq!(pretty("aabbccddeeff"), "AA:BB:CC:DD:EE:FF");
        assert_eq!(pretty("001122334455"), "00:11:22:33:44:55");
    }

    #[test]
    fn pretty_refuses_invalid_addresses() {
        assert_eq!(pretty("aabbccddee"), "");
        assert_eq!(pretty("AA:BB:CC:DD:EE:FF"), "");
        assert_eq!(pretty("not-a-mac"), "");
    }
}
