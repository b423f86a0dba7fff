//! # 서비스 계층
//!
//! 저장소 호출을 조합하는 비즈니스 로직입니다.
//! - `catalog`: 상품 캐시(CatalogCache)와 상품 생성/수정/삭제
//! - `credentials`: 운영자 계정 검증
//! - `orders`: 주문 생성과 배송 완료 전환
//! - `sequence`: productId/orderId 발급
//! - `sessions`: 세션 토큰 저장소와 만료 세션 정리 작업

pub mod catalog;
pub mod credentials;
pub mod orders;
pub mod sequence;
pub mod sessions;

use crate::error::AppError;

/// URL 경로의 record identity를 검증하고 저장 형식(소문자 하이픈 UUID)으로 맞춥니다.
///
/// 형식이 틀리면 NotFound가 아니라 BadRequest입니다.
pub fn parse_record_id(raw: &str, what: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID format", what)))
}

/// 새 record identity (UUIDv7)
pub fn new_record_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
