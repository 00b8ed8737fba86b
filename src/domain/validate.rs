//! Gatekeepers for externally influenced values.
//!
//! Every configured URL or host address passes through here before it is
//! handed to a probe. A rejected value never reaches a process runner.

use reqwest::Url;

/// `true` iff `s` parses as an absolute URL with an `http` or `https` scheme.
pub fn is_valid_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// `true` iff `s` is a non-empty `[A-Za-z0-9._-]` string starting with an
/// alphanumeric character.
pub fn is_valid_hostname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(is_valid_url("http://127.0.0.1:18789/health"));
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://localhost:8080/api/v1?x=1"));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        for s in [
            "javascript:alert(1)",
            "ftp://example.com/file",
            "file:///etc/passwd",
            "data:text/html,hi",
            "not a url",
            "",
            "http//missing-colon",
            "127.0.0.1:8080",
        ] {
            assert!(!is_valid_url(s), "{s:?} should be rejected");
        }
    }

    #[test]
    fn accepts_plain_hosts_and_addresses() {
        for s in ["localhost", "192.168.1.10", "nas-01.lan", "host_1", "a"] {
            assert!(is_valid_hostname(s), "{s:?} should be accepted");
        }
    }

    #[test]
    fn rejects_shell_metacharacters() {
        for s in [
            "host; rm -rf /",
            "a|b",
            "a&b",
            "`id`",
            "$(id)",
            "a b",
            "a\nb",
            "fe80::1",
            "ünïcode",
        ] {
            assert!(!is_valid_hostname(s), "{s:?} should be rejected");
        }
    }

    #[test]
    fn rejects_empty_and_leading_punctuation() {
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname(".hidden"));
        assert!(!is_valid_hostname("-flag"));
        assert!(!is_valid_hostname("_under"));
    }
}
