//! Email address formats (RFC 5322 addr-spec, RFC 6531 for the IDN
//! variant).

use super::hostname;
use super::ipaddr;

/// ASCII `local@domain` per RFC 5322: dot-atom or quoted-string local
/// part, hostname or address-literal domain.
pub fn email(value: &str) -> bool {
    check(value, false)
}

/// RFC 6531 widens atext to non-ASCII characters.
pub fn idn_email(value: &str) -> bool {
    check(value, true)
}

fn check(value: &str, idn: bool) -> bool {
    let Some(at) = find_at(value) else {
        return false;
    };
    let (local, domain) = (&value[..at], &value[at + 1..]);
    let atext: fn(char) -> bool = if idn {
        |c| is_atext(c) || !c.is_ascii()
    } else {
        is_atext
    };
    local_part(local, atext) && domain_part(domain, idn)
}

/// The `@` separating local part and domain: the last one outside a
/// quoted string.
fn find_at(value: &str) -> Option<usize> {
    let mut quoted = false;
    let mut escaped = false;
    let mut at = None;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            '@' if !quoted => at = Some(i),
            _ => {}
        }
    }
    at
}

fn local_part(local: &str, atext: fn(char) -> bool) -> bool {
    if local.is_empty() {
        return false;
    }
    if local.starts_with('"') {
        return quoted_string(local);
    }
    // dot-atom: atext runs separated by single dots
    local
        .split('.')
        .all(|run| !run.is_empty() && run.chars().all(atext))
}

fn quoted_string(value: &str) -> bool {
    let mut chars = value.chars();
    if chars.next() != Some('"') {
        return false;
    }
    let mut closed = false;
    while let Some(c) = chars.next() {
        if closed {
            return false;
        }
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '"' => closed = true,
            c if (c as u32) < 0x20 => return false,
            _ => {}
        }
    }
    closed
}

fn domain_part(domain: &str, idn: bool) -> bool {
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return match literal.strip_prefix("IPv6:") {
            Some(v6) => ipaddr::ipv6(v6),
            None => ipaddr::ipv4(literal),
        };
    }
    if idn {
        hostname::idn_hostname(domain)
    } else {
        hostname::hostname(domain)
    }
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(email("a@b.c"));
        assert!(email("first.last@example.com"));
        assert!(email("user+tag@example.co.jp"));
        assert!(email("\"quoted local\"@example.com"));
        assert!(email("postmaster@[192.168.0.1]"));
        assert!(email("postmaster@[IPv6:::1]"));
        assert!(!email("not-an-email"));
        assert!(!email("@example.com"));
        assert!(!email("a@"));
        assert!(!email("a..b@example.com"));
        assert!(!email("a@-bad-.example"));
    }

    #[test]
    fn test_idn_email() {
        assert!(idn_email("渡辺@例え.テスト"));
        assert!(!email("渡辺@例え.テスト"));
    }
}
