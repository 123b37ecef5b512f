//! Internet hostname formats (RFC 1034 / RFC 5890).

const MAX_LABEL: usize = 63;
const MAX_NAME: usize = 253;

/// ASCII hostname per RFC 1034 practice: dot-separated labels of letters,
/// digits and interior hyphens.
pub fn hostname(value: &str) -> bool {
    check(value, |c| c.is_ascii_alphanumeric())
}

/// Internationalized hostname (RFC 5890): the label character class widens
/// to non-ASCII letters and digits.
pub fn idn_hostname(value: &str) -> bool {
    check(value, |c| c.is_alphanumeric())
}

fn check(value: &str, is_label_char: fn(char) -> bool) -> bool {
    if value.is_empty() || value.len() > MAX_NAME {
        return false;
    }
    value.split('.').all(|label| {
        if label.is_empty() || label.len() > MAX_LABEL {
            return false;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }
        label.chars().all(|c| c == '-' || is_label_char(c))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname() {
        assert!(hostname("example.com"));
        assert!(hostname("a.b-c.d0"));
        assert!(!hostname("-leading.example"));
        assert!(!hostname("trailing-.example"));
        assert!(!hostname("double..dot"));
        assert!(!hostname(""));
        assert!(!hostname(&"a".repeat(64)));
    }

    #[test]
    fn test_idn_hostname() {
        assert!(idn_hostname("例え.テスト"));
        assert!(!hostname("例え.テスト"));
        assert!(!idn_hostname("bad..example"));
    }
}
