//! # 상품(Product) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/products`      → 상품 목록 (캐시에서 응답)
//! - `GET    /api/products/{id}` → 상품 하나 (record identity 또는 productId)
//! - `POST   /api/products`      → 상품 생성 (운영자)
//! - `PUT    /api/products/{id}` → 상품 수정 (운영자)
//! - `DELETE /api/products/{id}` → 상품 삭제 (운영자)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::AdminSession,
    models::*,
    routes::{ApiJson, AppState},
    services::catalog,
};

pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog.list().await)
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = catalog::find_product(&state.pool, &id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminSession,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product =
        catalog::create_product(&state.pool, &state.sequencer, &state.catalog, req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let product = catalog::update_product(&state.pool, &state.catalog, &id, req).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    catalog::delete_product(&state.pool, &state.catalog, &id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
