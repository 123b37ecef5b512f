//! IP address formats, parsed with the standard library address types.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Dotted-quad IPv4; leading zeros are rejected.
pub fn ipv4(value: &str) -> bool {
    Ipv4Addr::from_str(value).is_ok()
}

/// RFC 4291 IPv6 text form, including `::` compression and embedded IPv4.
pub fn ipv6(value: &str) -> bool {
    Ipv6Addr::from_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4() {
        assert!(ipv4("192.168.0.1"));
        assert!(ipv4("0.0.0.0"));
        assert!(!ipv4("256.1.1.1"));
        assert!(!ipv4("192.168.0"));
        assert!(!ipv4("192.168.000.001"));
    }

    #[test]
    fn test_ipv6() {
        assert!(ipv6("::1"));
        assert!(ipv6("2001:db8::8a2e:370:7334"));
        assert!(ipv6("::ffff:192.0.2.1"));
        assert!(!ipv6("2001:db8::8a2e::7334"));
        assert!(!ipv6("12345::"));
    }
}
