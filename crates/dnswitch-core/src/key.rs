//! Registry key derivation.

use crate::types::ServerKey;

/// Derive a registry key from a display name.
///
/// The name is uppercased, every run of characters outside `[A-Z0-9]` becomes
/// a single `_`, and leading/trailing `_` are dropped. Applying it to its own
/// output returns the same key.
///
/// ```
/// use dnswitch_core::generate_key;
///
/// assert_eq!(generate_key("  Cloudflare DoH (fast!) ").as_str(), "CLOUDFLARE_DOH_FAST");
/// ```
#[must_use]
pub fn generate_key(name: &str) -> ServerKey {
    let mut key = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars().flat_map(char::to_uppercase) {
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(c);
        } else {
            pending_separator = true;
        }
    }

    ServerKey::new(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_names() {
        assert_eq!(generate_key("Google DNS").as_str(), "GOOGLE_DNS");
        assert_eq!(generate_key("Cloudflare DoH3").as_str(), "CLOUDFLARE_DOH3");
        assert_eq!(generate_key("DynX AntiBan DoH").as_str(), "DYNX_ANTIBAN_DOH");
    }

    #[test]
    fn test_runs_collapse_and_edges_trim() {
        assert_eq!(generate_key("__a -- b__").as_str(), "A_B");
        assert_eq!(generate_key("my.dns/server #2").as_str(), "MY_DNS_SERVER_2");
        assert_eq!(generate_key("!!!").as_str(), "");
        assert_eq!(generate_key("").as_str(), "");
    }

    #[test]
    fn test_non_ascii_becomes_separator() {
        assert_eq!(generate_key("Café résolveur").as_str(), "CAF_R_SOLVEUR");
        assert_eq!(generate_key("straße").as_str(), "STRASSE");
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        for name in [
            "Quad9 DoT",
            "  spaced   out  ",
            "ünïcødé name",
            "x",
            "ControlD (Free) DoH3",
            "a_b_c",
        ] {
            let first = generate_key(name);
            assert_eq!(first, generate_key(name));
            assert_eq!(generate_key(first.as_str()), first);
        }
    }
}
