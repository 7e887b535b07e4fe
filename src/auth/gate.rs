//! Route guards for console and tenant pages

use axum::extract::{Request, State};
use axum::http::header::{ACCEPT, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use super::cookies::{clear_cookie, cookie_value, SESSION_COOKIE, TENANT_COOKIE};
use super::AuthError;
use crate::api::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const TENANT_LOGIN_PATH: &str = "/tenant/login";

/// Only same-site absolute paths are accepted as post-login targets.
///
/// Browsers strip tabs and newlines before resolving a Location, so `/\t/host`
/// would become `//host`. Anything but visible ASCII is refused outright.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && path.chars().all(|c| c.is_ascii_graphic()) =>
        {
            path
        }
        _ => "/",
    }
}

pub fn login_url(login_path: &str, uri: &Uri) -> String {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    if target == "/" {
        return login_path.to_string();
    }
    format!("{}?next={}", login_path, urlencoding::encode(target))
}

/// Script and SSE clients get a 401; browsers get sent to the login page
fn deny(request: &Request, login_path: &str, cookie: &str, err: AuthError) -> Response {
    let accept = request
        .headers()
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let machine = accept.contains("application/json") || accept.contains("text/event-stream");

    let mut response = if machine {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response()
    } else {
        Redirect::to(&login_url(login_path, request.uri())).into_response()
    };

    if err != AuthError::Missing {
        if let Ok(value) = HeaderValue::from_str(&clear_cookie(cookie)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// Console pages: valid operator session or redirect to login
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = cookie_value(request.headers(), SESSION_COOKIE).unwrap_or_default();
    match state.sessions.validate(&token).await {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            debug!(path = %request.uri().path(), reason = %err, "console session rejected");
            deny(&request, LOGIN_PATH, SESSION_COOKIE, err)
        }
    }
}

/// Tenant pages: valid tenant session or redirect to tenant login
pub async fn require_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = cookie_value(request.headers(), TENANT_COOKIE).unwrap_or_default();
    match state.tenant_sessions.validate(&token).await {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            debug!(path = %request.uri().path(), reason = %err, "tenant session rejected");
            deny(&request, TENANT_LOGIN_PATH, TENANT_COOKIE, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/meters?site_id=s-1")), "/meters?site_id=s-1");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn next_with_hidden_characters_is_refused() {
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/\n/evil.example")), "/");
        assert_eq!(safe_next(Some("/\r\n/evil.example")), "/");
        assert_eq!(safe_next(Some("/ /evil.example")), "/");
        assert_eq!(safe_next(Some("/\u{0}/evil.example")), "/");
        assert_eq!(safe_next(Some("/z\u{e4}hler")), "/");
    }

    #[test]
    fn login_url_keeps_query() {
        let uri: Uri = "/meters?site_id=s-1".parse().unwrap();
        assert_eq!(
            login_url(LOGIN_PATH, &uri),
            "/login?next=%2Fmeters%3Fsite_id%3Ds-1"
        );
        let root: Uri = "/".parse().unwrap();
        assert_eq!(login_url(LOGIN_PATH, &root), "/login");
    }
}
