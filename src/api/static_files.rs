//! Front-end assets. Only known content types are served; `.` and `..`
//! segments are resolved against the URL root first, so nothing outside
//! the static directory is reachable.

use std::path::Path;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::error::ApiError;
use super::rest::AppState;

const ALLOWED_EXTENSIONS: &[&str] = &[
    "html", "css", "js", "json", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff",
    "woff2", "map", "txt",
];

pub async fn serve(State(state): State<AppState>, mut req: Request) -> Response {
    let path = normalize_path(req.uri().path());
    if path != "/" && !has_allowed_extension(&path) {
        return ApiError::Forbidden.into_response();
    }

    let target = match req.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };
    match target.parse::<Uri>() {
        Ok(uri) => *req.uri_mut() = uri,
        Err(_) => return ApiError::NotFound.into_response(),
    }

    // ServeDir maps `/` to index.html and answers 404 for missing files.
    match ServeDir::new(state.static_dir.as_path()).oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Collapses empty and `.` segments and lets `..` pop, never past the root.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    if path.ends_with('/') && normalized.len() > 1 {
        normalized.push('/');
    }
    normalized
}

fn has_allowed_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list() {
        assert!(has_allowed_extension("/index.html"));
        assert!(has_allowed_extension("/assets/app.JS"));
        assert!(has_allowed_extension("/fonts/inter.woff2"));
        assert!(!has_allowed_extension("/.env"));
        assert!(!has_allowed_extension("/config.yaml"));
        assert!(!has_allowed_extension("/server.sh"));
        assert!(!has_allowed_extension("/assets/"));
    }

    #[test]
    fn traversal_segments_are_resolved_at_the_root() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/a/../index.html"), "/index.html");
        assert_eq!(normalize_path("/../../etc/passwd.txt"), "/etc/passwd.txt");
        assert_eq!(normalize_path("/./css//app.css"), "/css/app.css");
        assert_eq!(normalize_path("/assets/.."), "/");
        assert_eq!(normalize_path("/assets/img/"), "/assets/img/");
    }
}
