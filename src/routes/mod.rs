//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `auth`: 로그인, 로그아웃, 세션 확인
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `orders`: 주문 생성, 조회, 배송 완료 처리
//! - `products`: 상품 목록/조회(공개)와 생성/수정/삭제(운영자)
//!
//! ## 인증
//! 운영자 전용 핸들러는 `AdminSession` 추출기를 매개변수로 받습니다.
//! 추출에 실패하면 핸들러 본문이 실행되기 전에 401이 반환됩니다.

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::services::{
    catalog::CatalogCache, credentials::AdminCredentials, orders::DeliveryLock,
    sequence::Sequencer, sessions::SessionStore,
};

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 각 컴포넌트는 `main`에서 한 번 만들어져 주입되며, 전역 변수는 없습니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// 상품 목록 캐시
    pub catalog: Arc<CatalogCache>,
    /// 운영자 세션 저장소
    pub sessions: Arc<SessionStore>,
    /// productId/orderId 발급기
    pub sequencer: Arc<Sequencer>,
    /// 배송 완료 전환 잠금
    pub deliveries: Arc<DeliveryLock>,
    /// 운영자 계정
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    pub fn new(pool: SqlitePool, admin: AdminCredentials) -> Self {
        Self {
            pool,
            catalog: Arc::new(CatalogCache::new()),
            sessions: Arc::new(SessionStore::new()),
            sequencer: Arc::new(Sequencer::new()),
            deliveries: Arc::new(DeliveryLock::new()),
            admin: Arc::new(admin),
        }
    }
}

/// `axum::Json`과 같지만 파싱 실패를 `AppError::BadRequest`(400)로 돌려줍니다.
///
/// 튜플 구조체(newtype)라서 핸들러에서 `ApiJson(req): ApiJson<T>`로 바로 구조 분해합니다.
pub struct ApiJson<T>(pub T);

// FromRequest: 요청 본문을 소비하는 추출기. 핸들러의 마지막 매개변수에만 올 수 있습니다.
// T: DeserializeOwned → 본문 버퍼를 빌리지 않고 소유한 값으로 역직렬화

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            // JsonRejection → AppError 변환은 error.rs의 From 구현이 담당합니다.
            Err(rejection) => {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                Err(AppError::from(rejection))
            }
        }
    }
}

/// `/api` 아래의 모든 라우트
///
/// | 메서드 | 경로 | 인증 |
/// |--------|------|------|
/// | GET | /products, /products/{id} | 없음 |
/// | POST | /products | 운영자 |
/// | PUT, DELETE | /products/{id} | 운영자 |
/// | POST | /orders | 없음 |
/// | GET | /orders, /orders/{id} | 운영자 |
/// | POST | /orders/{id}/deliver | 운영자 |
/// | GET | /delivered | 운영자 |
/// | POST | /auth/login | 없음 |
/// | POST | /auth/logout | 운영자 |
/// | GET | /auth/check | 선택 |
/// | GET | /health | 없음 |
pub fn api_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check", get(auth::check));

    Router::new()
        .merge(auth_routes)
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/deliver", post(orders::mark_delivered))
        .route("/delivered", get(orders::list_delivered))
        .route("/health", get(health::health_check))
        .with_state(state)
}
