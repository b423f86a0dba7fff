//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! ## 분류와 HTTP 상태 코드
//! | 분류 | variant | 상태 |
//! |------|---------|------|
//! | 잘못된 입력 | `BadRequest` | 400 |
//! | 인증 실패 | `Unauthorized` | 401 |
//! | 없음 | `NotFound` | 404 |
//! | 저장소 오류 | `Database`, `StoreTimeout`, `Internal` | 500 |
//! | 정합성 오류 | `Consistency` | 500 (별도 code) |

use axum::{
    extract::rejection::JsonRejection,  // JSON 추출 실패 사유 (문법 오류, Content-Type 누락 등)
    http::StatusCode,                   // HTTP 상태 코드 (200, 404, 500 등)
    response::{IntoResponse, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error; // thiserror: 커스텀 에러 타입을 쉽게 만들어주는 매크로 크레이트

// #[derive(Debug, Error)]:
// - Debug: 디버깅용 출력 ({:?})
// - Error (thiserror): std::error::Error와 Display를 자동 구현합니다.
//   그래서 main의 anyhow::Result로도 `?` 전파가 됩니다.

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("{0}")]
    NotFound(String),

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx 함수의 에러에 `?`를 쓰면 자동으로 이 variant로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 저장소 호출이 제한 시간 안에 끝나지 않음 (HTTP 500)
    /// 자동 재시도는 하지 않습니다. 재시도 여부는 호출자가 결정합니다.
    #[error("Store operation timed out")]
    StoreTimeout,

    /// 배송 완료 전환 중 보상(compensation)까지 실패하여
    /// 주문이 두 컬렉션에 동시에 남은 상태 (HTTP 500)
    /// 수동 정리가 필요하므로 절대 자동 재시도하지 않습니다.
    #[error("Consistency error: {0}")]
    Consistency(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    /// 저장소가 고유 제약(PRIMARY KEY / UNIQUE) 위반으로 거절했는지 확인합니다.
    pub fn is_unique_violation(&self) -> bool {
        // 중첩 패턴: AppError::Database 안의 sqlx::Error::Database까지 한 번에 매칭합니다.
        match self {
            AppError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

// 잘못된 JSON 본문(파싱 실패, Content-Type 누락 등)을 400으로 통일합니다.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, StoreTimeout, Internal, Consistency)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::StoreTimeout => {
                tracing::error!("Store operation timed out");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Consistency(ref msg) => {
                tracing::error!(reconcile = true, "Consistency error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "consistency_error",
                    "The order could not be moved cleanly and needs manual reconciliation"
                        .to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "not_found", "message": "Order not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
