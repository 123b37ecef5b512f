//! URI-family formats: RFC 3986 (`uri`, `uri-reference`), RFC 3987
//! (`iri`, `iri-reference`) and RFC 6570 (`uri-template`).
//!
//! These are grammar checks, not resolvers: each component is validated
//! against its allowed character class with percent-encoding.

/// Absolute URI: a scheme is required.
pub fn uri(value: &str) -> bool {
    check_reference(value, false).map_or(false, |absolute| absolute)
}

/// URI reference: absolute or relative.
pub fn uri_reference(value: &str) -> bool {
    check_reference(value, false).is_some()
}

/// Absolute IRI: as `uri` with the unreserved class widened to non-ASCII.
pub fn iri(value: &str) -> bool {
    check_reference(value, true).map_or(false, |absolute| absolute)
}

/// IRI reference: absolute or relative.
pub fn iri_reference(value: &str) -> bool {
    check_reference(value, true).is_some()
}

/// Validate a reference; `Some(true)` when it carries a scheme.
fn check_reference(value: &str, iri: bool) -> Option<bool> {
    // fragment first: only one '#' allowed
    let (rest, fragment) = match value.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (value, None),
    };
    if let Some(fragment) = fragment {
        if fragment.contains('#') || !component_ok(fragment, "/?", iri) {
            return None;
        }
    }
    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (rest, None),
    };
    if let Some(query) = query {
        if !component_ok(query, "/?", iri) {
            return None;
        }
    }
    let (absolute, hier) = match split_scheme(rest) {
        Some(hier) => (true, hier),
        None => (false, rest),
    };
    if let Some(authority_and_path) = hier.strip_prefix("//") {
        let (authority, path) = match authority_and_path.find('/') {
            Some(slash) => authority_and_path.split_at(slash),
            None => (authority_and_path, ""),
        };
        if !authority_ok(authority, iri) || !component_ok(path, "/", iri) {
            return None;
        }
    } else {
        if !component_ok(hier, "/", iri) {
            return None;
        }
        // A relative reference's first segment must not contain ':',
        // which would read as a scheme.
        if !absolute {
            let first_segment = hier.split('/').next().unwrap_or("");
            if first_segment.contains(':') {
                return None;
            }
        }
    }
    Some(absolute)
}

fn split_scheme(value: &str) -> Option<&str> {
    let colon = value.find(':')?;
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(&value[colon + 1..])
}

fn authority_ok(authority: &str, iri: bool) -> bool {
    let (userinfo, host_port) = match authority.rsplit_once('@') {
        Some((userinfo, host_port)) => (Some(userinfo), host_port),
        None => (None, authority),
    };
    if let Some(userinfo) = userinfo {
        if !component_ok(userinfo, ":", iri) {
            return false;
        }
    }
    // IP literal in brackets
    if let Some(rest) = host_port.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            return false;
        };
        let (literal, port) = (&rest[..end], &rest[end + 1..]);
        if !super::ipaddr::ipv6(literal) && !v_future_ok(literal) {
            return false;
        }
        return port.is_empty()
            || port
                .strip_prefix(':')
                .is_some_and(|p| p.chars().all(|c| c.is_ascii_digit()));
    }
    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => host_port,
    };
    component_ok(host, "", iri)
}

fn v_future_ok(literal: &str) -> bool {
    let Some(rest) = literal.strip_prefix('v').or_else(|| literal.strip_prefix('V')) else {
        return false;
    };
    let Some((version, tail)) = rest.split_once('.') else {
        return false;
    };
    !version.is_empty()
        && version.chars().all(|c| c.is_ascii_hexdigit())
        && !tail.is_empty()
        && tail.chars().all(|c| unreserved(c, false) || sub_delim(c) || c == ':')
}

/// pchar-style component check with percent-encoding; `extra` lists the
/// additional punctuation permitted in this component.
fn component_ok(component: &str, extra: &str, iri: bool) -> bool {
    let bytes = component.as_bytes();
    let mut skip_until = 0;
    for (index, c) in component.char_indices() {
        if index < skip_until {
            continue;
        }
        if c == '%' {
            let hex = bytes.get(index + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(index + 2).is_some_and(u8::is_ascii_hexdigit);
            if !hex {
                return false;
            }
            skip_until = index + 3;
            continue;
        }
        if unreserved(c, iri) || sub_delim(c) || matches!(c, ':' | '@') || extra.contains(c) {
            continue;
        }
        return false;
    }
    true
}

fn unreserved(c: char, iri: bool) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~') || (iri && !c.is_ascii())
}

fn sub_delim(c: char) -> bool {
    matches!(
        c,
        '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '='
    )
}

/// RFC 6570 URI template: literals plus `{operator?varspec,...}`
/// expressions.
pub fn uri_template(value: &str) -> bool {
    let mut rest = value;
    loop {
        match rest.find('{') {
            None => return !rest.contains('}') && literal_ok(rest),
            Some(open) => {
                let (literal, tail) = rest.split_at(open);
                if literal.contains('}') || !literal_ok(literal) {
                    return false;
                }
                let Some(close) = tail.find('}') else {
                    return false;
                };
                if !expression_ok(&tail[1..close]) {
                    return false;
                }
                rest = &tail[close + 1..];
            }
        }
    }
}

fn literal_ok(literal: &str) -> bool {
    literal
        .chars()
        .all(|c| !matches!(c, '<' | '>' | '"' | '\'' | '^' | '`' | '|' | '\\') && (c as u32) > 0x20)
}

fn expression_ok(expression: &str) -> bool {
    let body = expression
        .strip_prefix(['+', '#', '.', '/', ';', '?', '&', '=', ',', '!', '@', '|'])
        .unwrap_or(expression);
    if body.is_empty() {
        return false;
    }
    body.split(',').all(varspec_ok)
}

fn varspec_ok(varspec: &str) -> bool {
    let name = varspec.strip_suffix('*').unwrap_or(varspec);
    let (name, prefix) = match name.split_once(':') {
        Some((name, prefix)) => (name, Some(prefix)),
        None => (name, None),
    };
    if let Some(prefix) = prefix {
        let ok = !prefix.is_empty()
            && prefix.len() <= 4
            && prefix.chars().all(|c| c.is_ascii_digit())
            && !prefix.starts_with('0');
        if !ok {
            return false;
        }
    }
    !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(varchar_ok))
}

fn varchar_ok(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_requires_scheme() {
        assert!(uri("https://example.com/path?q=1#frag"));
        assert!(uri("mailto:user@example.com"));
        assert!(uri("urn:isbn:0451450523"));
        assert!(!uri("/relative/path"));
        assert!(!uri("https://exa mple.com"));
    }

    #[test]
    fn test_uri_reference_accepts_relative() {
        assert!(uri_reference("/relative/path"));
        assert!(uri_reference("../up?x=y"));
        assert!(uri_reference("#frag"));
        assert!(uri_reference(""));
        assert!(!uri_reference("a b"));
    }

    #[test]
    fn test_iri_accepts_ucs() {
        assert!(iri("https://例え.テスト/パス"));
        assert!(!uri("https://例え.テスト/パス"));
        assert!(iri_reference("/パス"));
    }

    #[test]
    fn test_ip_literal_authority() {
        assert!(uri("http://[::1]:8080/"));
        assert!(!uri("http://[::1/"));
    }

    #[test]
    fn test_uri_template() {
        assert!(uri_template("http://example.com/~{username}/"));
        assert!(uri_template("/search{?q,lang}"));
        assert!(uri_template("{/list*,path:4}"));
        assert!(uri_template("no-expressions"));
        assert!(!uri_template("/bad{unclosed"));
        assert!(!uri_template("/bad{}"));
        assert!(!uri_template("/bad}brace{x}"));
        assert!(!uri_template("{var:05}"));
    }
}
