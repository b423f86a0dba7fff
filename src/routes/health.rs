//! # 헬스체크(Health Check) 핸들러
//!
//! 서버와 저장소가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /api/health` → `{ "status": "ok", "products": 8 }`
//!
//! 주로 로드밸런서나 컨테이너 오케스트레이터의 상태 확인에 사용됩니다.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{db, error::AppError, routes::AppState};

/// `GET /health`: 저장소에 간단한 쿼리를 보내 응답하는지 확인합니다.
///
/// 저장소가 응답하지 않으면 `AppError`(500)로 실패합니다.
/// `products`는 캐시에 올라와 있는 상품 수입니다.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    db::ping(&state.pool).await?;

    Ok(Json(json!({
        "status": "ok",
        "products": state.catalog.len().await
    })))
}
