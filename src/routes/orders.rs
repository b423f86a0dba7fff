//! # 주문(Order) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/orders`              → 주문 생성 (공개, 201)
//! - `GET  /api/orders`              → 처리 대기 주문 목록, 최신순 (운영자)
//! - `GET  /api/orders/{id}`         → 처리 대기 주문 하나, record identity로만 조회 (운영자)
//! - `POST /api/orders/{id}/deliver` → 배송 완료 처리 (운영자)
//! - `GET  /api/delivered`           → 배송 완료 목록, 배송 시각 최신순 (운영자)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    middleware::auth::AdminSession,
    models::*,
    routes::{ApiJson, AppState},
    services::orders,
};

pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = orders::create_order(&state.pool, &state.sequencer, req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(orders::list_orders(&state.pool).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::get_order(&state.pool, &id).await?))
}

/// 재시도 시 이미 옮겨진 주문은 404로 응답합니다 (형식 오류 400과 구분됨).
pub async fn mark_delivered(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<DeliveryReceipt>, AppError> {
    Ok(Json(orders::mark_delivered(&state.pool, &state.deliveries, &id).await?))
}

pub async fn list_delivered(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(orders::list_delivered(&state.pool).await?))
}
