//! # 요청 가드(guard)
//!
//! - `auth`: 세션 토큰 추출과 검증 (`AdminSession` 추출기), 세션 쿠키 생성

pub mod auth;
