//! Cross-origin response headers.
//!
//! Policy, first match wins:
//! 1. empty allow-list: mirror the request `Origin`
//! 2. allow-list contains `*`: wildcard
//! 3. request origin is listed: echo it
//! 4. otherwise no `Access-Control-Allow-Origin` at all

use axum::http::{header, HeaderMap, HeaderValue};

const ALLOW_METHODS: &str = "GET, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    pub fn headers(&self, request: &HeaderMap) -> HeaderMap {
        let mut out = HeaderMap::new();

        let origin = request.get(header::ORIGIN);
        let allow_origin = if self.allowed_origins.is_empty() {
            origin.cloned()
        } else if self.allowed_origins.iter().any(|o| o == "*") {
            Some(HeaderValue::from_static("*"))
        } else {
            origin.filter(|o| {
                o.to_str()
                    .is_ok_and(|o| self.allowed_origins.iter().any(|a| a == o))
            })
            .cloned()
        };

        if let Some(value) = allow_origin {
            out.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            if !self.allowed_origins.iter().any(|o| o == "*") {
                out.insert(header::VARY, HeaderValue::from_static("Origin"));
            }
        }
        out.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        out.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        out
    }
}
