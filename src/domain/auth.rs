//! Shared-secret bearer token check for `/api/*`.

use axum::http::{header, HeaderMap};

#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    token: Option<String>,
}

impl AuthGate {
    /// An empty token is treated the same as no token: auth disabled.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Accepts only `Authorization: Bearer <token>` with an exact match.
    pub fn check(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };

        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|presented| presented == expected.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = auth {
            h.insert(header::AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn disabled_gate_accepts_everything() {
        let gate = AuthGate::new(None);
        assert!(!gate.is_enabled());
        assert!(gate.check(&headers(None)));
        assert!(gate.check(&headers(Some("Bearer whatever"))));
        assert!(gate.check(&headers(Some("Basic dXNlcjpwYXNz"))));
    }

    #[test]
    fn empty_token_disables_gate() {
        let gate = AuthGate::new(Some(String::new()));
        assert!(!gate.is_enabled());
        assert!(gate.check(&headers(None)));
    }

    #[test]
    fn exact_bearer_token_passes() {
        let gate = AuthGate::new(Some("secret123".into()));
        assert!(gate.check(&headers(Some("Bearer secret123"))));
    }

    #[test]
    fn everything_else_is_rejected() {
        let gate = AuthGate::new(Some("secret123".into()));
        assert!(!gate.check(&headers(None)));
        assert!(!gate.check(&headers(Some("secret123"))));
        assert!(!gate.check(&headers(Some("Basic secret123"))));
        assert!(!gate.check(&headers(Some("bearer secret123"))));
        assert!(!gate.check(&headers(Some("Bearer secret1234"))));
        assert!(!gate.check(&headers(Some("Bearer  secret123"))));
        assert!(!gate.check(&headers(Some("Bearer "))));
    }
}
