//! Session middleware for Axum
//!
//! Resolves the request's session token (bearer header or session cookie)
//! into a `SessionUser` extension, alongside the `SessionSource` it came
//! from. Requests without a valid token pass through untouched; handlers
//! decide what an absent session means.

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::Response,
};

use plangate_shared::SessionUser;

use super::jwt::JwtManager;

/// Cookie set by the web app after sign-in
pub const SESSION_COOKIE: &str = "plangate_session";

/// Where the session token was read from
///
/// Browsers attach cookies to cross-site requests on their own, so
/// cookie sessions need an origin check before any state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Bearer,
    Cookie,
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn extract_token_from_cookie(request: &Request) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()).map(str::to_string))
        .filter(|token| !token.is_empty())
}

/// Resolve the session user for a request, if any
pub fn resolve_session(
    jwt_manager: &JwtManager,
    request: &Request,
) -> Option<(SessionUser, SessionSource)> {
    let (token, source) = extract_bearer_token(request)
        .map(|token| (token, SessionSource::Bearer))
        .or_else(|| extract_token_from_cookie(request).map(|token| (token, SessionSource::Cookie)))?;

    match jwt_manager.validate_token(&token) {
        Ok(claims) => Some((claims.into(), source)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session token");
            None
        }
    }
}

/// Attach the session user to the request when a valid token is present
pub async fn optional_session(
    State(jwt_manager): State<JwtManager>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some((user, source)) = resolve_session(&jwt_manager, &request) {
        tracing::debug!(user_id = %user.id, source = ?source, "Session resolved");
        request.extensions_mut().insert(user);
        request.extensions_mut().insert(source);
    }

    next.run(request).await
}
