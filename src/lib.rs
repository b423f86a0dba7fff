//! # Storefront
//!
//! 작은 온라인 상점의 백엔드입니다.
//!
//! - 누구나 상품 목록을 보고 주문할 수 있습니다.
//! - 운영자는 로그인해서 주문을 확인하고 배송 완료로 옮기며, 상품을 관리합니다.
//!
//! 실행 파일(`main.rs`)과 통합 테스트(`tests/`)가 같은 라우터를 쓰도록
//! 모듈들을 라이브러리로 공개합니다.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use routes::AppState;

/// API 라우트를 `/api` 아래에 중첩하고 CORS와 요청 로깅 미들웨어를 붙입니다.
pub fn app(state: AppState) -> Router {
    // 모든 출처 허용 (프론트엔드가 다른 도메인에서 호출)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
