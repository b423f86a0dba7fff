use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use cookie::{time::Duration, Cookie, SameSite};
use serde_json::json;

use crate::routes::AppState;
use crate::services::sessions::SESSION_TTL_SECS;

/// Cookie carrying the session token when no Authorization header is sent.
pub const AUTH_COOKIE: &str = "auth_token";

/// A request that carried a live operator session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // No token: reject without touching the session store.
        let token = extract_token(&parts.headers).ok_or(AuthError::MissingToken)?;

        if !state.sessions.validate(&token).await {
            return Err(AuthError::InvalidToken);
        }

        Ok(AdminSession { token })
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Authentication required",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid or expired session",
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Session token from `Authorization: Bearer <token>` or, failing that, the
/// `auth_token` cookie. A bare Authorization value without the prefix is
/// accepted as the token itself.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(bearer_token)
        .filter(|token| !token.is_empty());

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == AUTH_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

fn bearer_token(value: &str) -> &str {
    let value = value.trim();
    if value.eq_ignore_ascii_case("bearer") {
        return "";
    }
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    }
}

/// Whether the client reached us over HTTPS (directly behind a TLS
/// terminating proxy).
pub fn is_secure_request(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

fn base_cookie(value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    // Cross-origin requests over HTTPS need SameSite=None; plain HTTP keeps Lax.
    let same_site = if secure { SameSite::None } else { SameSite::Lax };

    Cookie::build((AUTH_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .max_age(max_age)
        .build()
}

pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    base_cookie(token.to_string(), Duration::seconds(SESSION_TTL_SECS), secure)
}

pub fn cleared_cookie(secure: bool) -> Cookie<'static> {
    base_cookie(String::new(), Duration::ZERO, secure)
}
