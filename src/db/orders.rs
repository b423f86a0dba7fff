//! # 주문 데이터베이스 쿼리 모듈
//!
//! 처리 대기(`orders`)와 배송 완료(`delivered_orders`) 두 컬렉션에 대한 쿼리입니다.
//!
//! ## 주문 라이프사이클
//! ```text
//! insert_order() → [orders] → insert_delivered() → delete_order() → [delivered_orders]
//! ```
//! 두 단계 사이에는 트랜잭션이 없습니다. 순서(삽입 후 삭제)와 보상 처리는
//! `services::orders::mark_delivered`가 책임집니다.

use crate::db::bounded;
use crate::error::AppError;
use crate::models::Order;
use sqlx::{types::Json, SqlitePool};

/// 새 주문을 처리 대기 컬렉션에 저장합니다.
pub async fn insert_order(pool: &SqlitePool, order: &Order) -> Result<(), AppError> {
    bounded(
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_id, customer, items, total, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(order.order_id)
        .bind(Json(&order.customer))
        .bind(Json(&order.items))
        .bind(order.total.to_string())
        .bind(order.status.as_str())
        .bind(&order.created_at)
        .execute(pool),
    )
    .await?;

    Ok(())
}

/// 처리 대기 중인 주문을 최신순으로 조회합니다.
///
/// 같은 밀리초에 생성된 주문은 orderId가 큰 쪽이 먼저 옵니다.
pub async fn list_orders(pool: &SqlitePool) -> Result<Vec<Order>, AppError> {
    bounded(
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_id, customer, items, total, status, created_at
            FROM orders
            ORDER BY created_at DESC, order_id DESC
            "#,
        )
        .fetch_all(pool),
    )
    .await
}

/// record identity로 처리 대기 중인 주문 하나를 조회합니다.
pub async fn find_order(pool: &SqlitePool, id: &str) -> Result<Option<Order>, AppError> {
    bounded(
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_id, customer, items, total, status, created_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool),
    )
    .await
}

/// 처리 대기 컬렉션에서 주문을 삭제합니다.
///
/// 행이 남아 있을 때만 삭제되므로 `Ok(false)`는 이미 다른 경로로 사라졌다는 뜻입니다.
pub async fn delete_order(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = bounded(sqlx::query("DELETE FROM orders WHERE id = ?").bind(id).execute(pool))
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 배송 완료 레코드를 저장합니다.
///
/// `id`가 기본키라서 같은 주문을 두 번 넣으면 고유 제약 위반 에러가 납니다.
pub async fn insert_delivered(pool: &SqlitePool, order: &Order) -> Result<(), AppError> {
    let delivered_at = order
        .delivered_at
        .as_deref()
        .ok_or_else(|| AppError::Internal("delivered record without deliveredAt".to_string()))?;

    bounded(
        sqlx::query(
            r#"
            INSERT INTO delivered_orders
                (id, order_id, customer, items, total, status, created_at, delivered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(order.order_id)
        .bind(Json(&order.customer))
        .bind(Json(&order.items))
        .bind(order.total.to_string())
        .bind(order.status.as_str())
        .bind(&order.created_at)
        .bind(delivered_at)
        .execute(pool),
    )
    .await?;

    Ok(())
}

/// 배송 완료 레코드를 삭제합니다. 전환 실패 시 보상(compensation)에만 사용합니다.
pub async fn delete_delivered(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = bounded(
        sqlx::query("DELETE FROM delivered_orders WHERE id = ?")
            .bind(id)
            .execute(pool),
    )
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 배송 완료된 주문을 배송 시각 최신순으로 조회합니다.
pub async fn list_delivered(pool: &SqlitePool) -> Result<Vec<Order>, AppError> {
    bounded(
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_id, customer, items, total, status, created_at, delivered_at
            FROM delivered_orders
            ORDER BY delivered_at DESC, order_id DESC
            "#,
        )
        .fetch_all(pool),
    )
    .await
}

pub async fn find_delivered(pool: &SqlitePool, id: &str) -> Result<Option<Order>, AppError> {
    bounded(
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_id, customer, items, total, status, created_at, delivered_at
            FROM delivered_orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool),
    )
    .await
}
