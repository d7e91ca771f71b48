//! Resource id helpers.
//!
//! Every class and object id is `<issuer id>.<suffix>`. Suffixes may only
//! contain ASCII alphanumerics, `.`, `_` and `-`.

use rand::Rng;

/// Join an issuer id and a suffix into a resource id.
pub fn resource_id(issuer_id: &str, suffix: &str) -> String {
    format!("{}.{}", issuer_id, suffix)
}

/// A random UUID (version 4 layout) with dashes replaced by underscores.
pub fn random_suffix() -> String {
    let mut bytes: [u8; 16] = rand::thread_rng().gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}_{}_{}_{}_{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Object suffixes embed the class suffix so related resources sort together.
pub fn object_suffix_for(class_suffix: &str) -> String {
    format!("{}-{}", random_suffix(), class_suffix)
}

/// Issuer ids are the numeric account id from the Pay & Wallet Console.
pub fn is_valid_issuer_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_suffix(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id() {
        assert_eq!(resource_id("3388000000022", "summer_sale"), "3388000000022.summer_sale");
    }

    #[test]
    fn test_random_suffix_shape() {
        let s = random_suffix();
        assert_eq!(s.len(), 36);
        assert!(!s.contains('-'));
        for (i, c) in s.chars().enumerate() {
            if i == 8 || i == 13 || i == 18 || i == 23 {
                assert_eq!(c, '_');
            } else {
                assert!(c.is_ascii_hexdigit());
            }
        }
        // Version nibble
        assert_eq!(&s[14..15], "4");
        assert!(is_valid_suffix(&s));
        assert_ne!(random_suffix(), s);
    }

    #[test]
    fn test_object_suffix_for() {
        let s = object_suffix_for("abc_def");
        assert!(s.ends_with("-abc_def"));
        assert_eq!(s.len(), 36 + 1 + "abc_def".len());
    }

    #[test]
    fn test_is_valid_issuer_id() {
        assert!(is_valid_issuer_id("3388000000022"));
        assert!(is_valid_issuer_id("1"));

        assert!(!is_valid_issuer_id(""));
        assert!(!is_valid_issuer_id("338#"));
        assert!(!is_valid_issuer_id("338/../../batch?x="));
        assert!(!is_valid_issuer_id(" 338"));
        assert!(!is_valid_issuer_id("٣٣٨"));
    }

    #[test]
    fn test_is_valid_suffix() {
        assert!(is_valid_suffix("OFFER_CLASS_SUFFIX"));
        assert!(is_valid_suffix("a.b-c_d9"));

        assert!(!is_valid_suffix(""));
        assert!(!is_valid_suffix("has space"));
        assert!(!is_valid_suffix("slash/inside"));
        assert!(!is_valid_suffix("ümlaut"));
    }
}
