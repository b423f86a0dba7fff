//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `product`: 상품(Product)과 상품 생성/수정 요청
//! - `order`: 주문(Order), 고객(Customer), 주문 항목(OrderItem)
//! - `auth`: 로그인 요청/응답
//!
//! JSON 필드 이름은 프론트엔드와 맞추기 위해 camelCase를 사용합니다.

pub mod auth;
pub mod order;
pub mod product;

pub use auth::*;
pub use order::*;
pub use product::*;

use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

/// 현재 UTC 시각을 저장용 문자열로 만듭니다.
///
/// 자릿수가 고정된 형식이라 문자열 정렬 순서와 시간 순서가 같습니다.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// TEXT 컬럼에 저장된 10진수(가격, 합계)를 읽어옵니다.
pub(crate) fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    raw.parse::<Decimal>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}
