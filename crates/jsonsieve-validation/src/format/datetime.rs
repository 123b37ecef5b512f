//! RFC 3339 date and time formats.

/// `full-date`: `YYYY-MM-DD` with real calendar bounds.
pub fn date(value: &str) -> bool {
    parse_date(value.as_bytes()).is_some()
}

/// `full-time`: `HH:MM:SS[.frac](Z|±HH:MM)`.
pub fn time(value: &str) -> bool {
    parse_time(value.as_bytes()).is_some()
}

/// `date-time`: full-date `T` full-time, `T` case-insensitive.
pub fn date_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 11 || !matches!(bytes[10], b'T' | b't') {
        return false;
    }
    parse_date(&bytes[..10]).is_some() && parse_time(&bytes[11..]).is_some()
}

fn digits(bytes: &[u8]) -> Option<u32> {
    let mut value = 0u32;
    for b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u32::from(b - b'0');
    }
    Some(value)
}

fn parse_date(bytes: &[u8]) -> Option<()> {
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let year = digits(&bytes[..4])?;
    let month = digits(&bytes[5..7])?;
    let day = digits(&bytes[8..10])?;
    if !(1..=12).contains(&month) || day == 0 {
        return None;
    }
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let max_day = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if leap {
                29
            } else {
                28
            }
        }
    };
    (day <= max_day).then_some(())
}

fn parse_time(bytes: &[u8]) -> Option<()> {
    if bytes.len() < 9 || bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }
    let hour = digits(&bytes[..2])?;
    let minute = digits(&bytes[3..5])?;
    // 60 covers leap seconds, which RFC 3339 permits.
    let second = digits(&bytes[6..8])?;
    if hour > 23 || minute > 59 || second > 60 {
        return None;
    }
    let mut rest = &bytes[8..];
    if rest.first() == Some(&b'.') {
        let fraction_len = rest[1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if fraction_len == 0 {
            return None;
        }
        rest = &rest[1 + fraction_len..];
    }
    match rest {
        [b'Z'] | [b'z'] => Some(()),
        [sign, h1, h0, b':', m1, m0] if matches!(sign, b'+' | b'-') => {
            let hour = digits(&[*h1, *h0])?;
            let minute = digits(&[*m1, *m0])?;
            (hour <= 23 && minute <= 59).then_some(())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date() {
        assert!(date("2020-02-29"));
        assert!(!date("2019-02-29"));
        assert!(!date("2020-13-01"));
        assert!(!date("2020-00-10"));
        assert!(!date("20200110"));
    }

    #[test]
    fn test_time() {
        assert!(time("23:59:59Z"));
        assert!(time("23:59:60Z"));
        assert!(time("08:30:06.283185Z"));
        assert!(time("16:39:57-08:00"));
        assert!(!time("24:00:00Z"));
        assert!(!time("12:00:00"));
        assert!(!time("12:00:00.+01:00"));
    }

    #[test]
    fn test_date_time() {
        assert!(date_time("1985-04-12T23:20:50.52Z"));
        assert!(date_time("1996-12-19t16:39:57-08:00"));
        assert!(!date_time("1985-04-12 23:20:50Z"));
        assert!(!date_time("1985-04-12"));
    }
}
