use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    error::AppError,
    middleware::auth::{cleared_cookie, extract_token, is_secure_request, session_cookie, AdminSession},
    models::*,
    routes::{ApiJson, AppState},
    services::sessions::SESSION_TTL_SECS,
};

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.admin.verify(&req.username, &req.password) {
        tracing::warn!(username = %req.username, "Rejected operator login");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.sessions.issue().await?;
    let cookie = session_cookie(&token, is_secure_request(&headers));
    tracing::info!(username = %state.admin.username(), "Operator logged in");

    Ok((
        [(SET_COOKIE, cookie.to_string())],
        Json(LoginResponse {
            token,
            message: "Login successful".to_string(),
            expires_in: SESSION_TTL_SECS,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    session: AdminSession,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.sessions.revoke(&session.token).await;
    let cookie = cleared_cookie(is_secure_request(&headers));

    (
        [(SET_COOKIE, cookie.to_string())],
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// Reports whether the caller holds a live session. Never fails: an absent
/// or stale token is simply `authenticated: false` with a 401.
pub async fn check(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, Json<AuthStatus>) {
    let authenticated = match extract_token(&headers) {
        Some(token) => state.sessions.validate(&token).await,
        None => false,
    };

    let status = if authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };

    (status, Json(AuthStatus { authenticated }))
}
