//! # 순번(sequence) 쿼리 모듈
//!
//! 현재 저장된 최댓값을 내림차순 정렬로 읽어 다음 번호를 계산합니다.
//! 읽기와 삽입 사이의 경쟁은 `services::sequence::Sequencer`가 막습니다.

use crate::db::bounded;
use crate::error::AppError;
use sqlx::SqlitePool;

/// 다음 productId. 상품이 하나도 없으면 1입니다.
pub async fn next_product_id(pool: &SqlitePool) -> Result<i64, AppError> {
    let top: Option<(i64,)> = bounded(
        sqlx::query_as("SELECT product_id FROM products ORDER BY product_id DESC LIMIT 1")
            .fetch_optional(pool),
    )
    .await?;

    Ok(top.map_or(1, |(max,)| max + 1))
}

/// 다음 orderId. 주문이 하나도 없으면 1입니다.
///
/// 배송 완료된 주문의 번호도 포함하므로 배송 후에도 번호가 재사용되지 않습니다.
pub async fn next_order_id(pool: &SqlitePool) -> Result<i64, AppError> {
    let top: Option<(i64,)> = bounded(
        sqlx::query_as(
            r#"
            SELECT order_id FROM (
                SELECT order_id FROM orders
                UNION ALL
                SELECT order_id FROM delivered_orders
            )
            ORDER BY order_id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(pool),
    )
    .await?;

    Ok(top.map_or(1, |(max,)| max + 1))
}
