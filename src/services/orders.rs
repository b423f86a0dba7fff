//! # 주문 라이프사이클
//!
//! 주문 생성(가격 계산, orderId 발급, 저장)과 배송 완료 전환을 담당합니다.
//!
//! ## 배송 완료 전환 (mark delivered)
//! ```text
//! 1. orders에서 조회           (없으면 NotFound)
//! 2. 배송 완료 레코드 생성      (status = delivered, delivered_at = now)
//! 3. delivered_orders에 삽입   (이미 있으면 이전 시도의 흔적: 처리 대기 레코드가 없으면 NotFound,
//!                              남아 있으면 4단계를 마저 진행)
//! 4. orders에서 삭제
//! 5. 4가 실패하면 3에서 넣은 레코드를 삭제(보상)하고 에러 보고
//!    보상도 실패하면 Consistency 에러 (두 컬렉션에 모두 존재, 수동 정리 필요)
//! ```
//! 삽입을 먼저 하므로 중간에 프로세스가 죽어도 주문이 사라지지 않습니다.
//! 최악의 경우는 두 컬렉션에 중복 존재하는 것입니다.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::db;
use crate::error::AppError;
use crate::models::*;
use crate::services::sequence::{IdKind, Sequencer};
use crate::services::{new_record_id, parse_record_id};

/// 주문 항목들의 합계를 저장소의 현재 가격으로 계산합니다.
///
/// 합계가 `Decimal`로 표현할 수 있는 범위를 넘으면 BadRequest입니다.
/// 존재하지 않는 상품은 에러 없이 0으로 계산합니다. 삭제된 상품을 허용하려는
/// 의도인지 잘못된 입력을 숨기는 것인지는 아직 결정되지 않았으므로 경고 로그만 남깁니다.
pub async fn compute_total(pool: &SqlitePool, items: &[OrderItem]) -> Result<Decimal, AppError> {
    let mut total = Decimal::ZERO;
    for item in items {
        match db::products::find_by_product_id(pool, item.product_id).await? {
            Some(product) => {
                // checked_*: 범위를 넘으면 panic 대신 None을 돌려줍니다.
                total = product
                    .price
                    .checked_mul(Decimal::from(item.quantity))
                    .and_then(|line| total.checked_add(line))
                    .ok_or_else(|| AppError::BadRequest("Order total is too large".to_string()))?;
            }
            None => tracing::warn!(
                product_id = item.product_id,
                quantity = item.quantity,
                "Order item references unknown product, counting it as zero"
            ),
        }
    }
    Ok(total)
}

/// 새 주문을 생성합니다.
///
/// 항목이 비어 있거나 수량이 0 이하이면 BadRequest입니다.
pub async fn create_order(
    pool: &SqlitePool,
    sequencer: &Sequencer,
    req: CreateOrderRequest,
) -> Result<Order, AppError> {
    if req.items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".to_string(),
        ));
    }
    if let Some(item) = req.items.iter().find(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest(format!(
            "Quantity for product {} must be greater than zero",
            item.product_id
        )));
    }

    let total = compute_total(pool, &req.items).await?;

    // orderId 계산부터 삽입까지 같은 티켓을 쥐고 있어야 번호가 겹치지 않습니다.
    let ticket = sequencer.reserve(pool, IdKind::Order).await?;
    let order = Order {
        id: new_record_id(),
        order_id: ticket.id,
        customer: req.customer,
        items: req.items,
        total,
        status: OrderStatus::Pending,
        created_at: now_timestamp(),
        delivered_at: None,
    };
    db::orders::insert_order(pool, &order).await?;
    drop(ticket);

    tracing::info!(order_id = order.order_id, id = %order.id, total = %order.total, "Order created");
    Ok(order)
}

pub async fn list_orders(pool: &SqlitePool) -> Result<Vec<Order>, AppError> {
    db::orders::list_orders(pool).await
}

/// record identity로 처리 대기 중인 주문을 조회합니다. orderId로는 찾지 않습니다.
pub async fn get_order(pool: &SqlitePool, raw_id: &str) -> Result<Order, AppError> {
    let id = parse_record_id(raw_id, "order")?;
    db::orders::find_order(pool, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

pub async fn list_delivered(pool: &SqlitePool) -> Result<Vec<Order>, AppError> {
    db::orders::list_delivered(pool).await
}

/// 배송 완료 전환을 이 프로세스 안에서 한 번에 하나씩만 실행하게 하는 잠금
///
/// 전환이 겹치지 않으므로 3단계에서 만나는 고유 제약 위반은 진행 중인 다른 전환이
/// 아니라 이전 시도가 남긴 레코드입니다 (`resume_delivery` 참고).
#[derive(Debug, Default)]
pub struct DeliveryLock {
    turn: Mutex<()>,
}

impl DeliveryLock {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 처리 대기 중인 주문을 배송 완료 컬렉션으로 옮깁니다.
///
/// 이미 옮겨진 주문(재시도, 동시 요청)은 NotFound로 보고합니다.
pub async fn mark_delivered(
    pool: &SqlitePool,
    lock: &DeliveryLock,
    raw_id: &str,
) -> Result<DeliveryReceipt, AppError> {
    let id = parse_record_id(raw_id, "order")?;

    // `_turn`이 스코프를 벗어날 때(함수 반환 시) 잠금이 풀립니다.
    let _turn = lock.turn.lock().await;

    // 1. 조회
    let order = db::orders::find_order(pool, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    let order_id = order.order_id;

    // 2. 배송 완료 레코드
    let delivered_at = now_timestamp();
    let delivered = order.into_delivered(delivered_at.clone());

    // 3. 삽입
    if let Err(e) = db::orders::insert_delivered(pool, &delivered).await {
        if e.is_unique_violation() {
            return resume_delivery(pool, &id, order_id).await;
        }
        return Err(e);
    }

    // 4. 삭제
    match db::orders::delete_order(pool, &id).await {
        Ok(true) => {}
        Ok(false) => {
            // 조회 이후 처리 대기 레코드가 사라졌습니다. 남은 사본은 방금 넣은 것뿐이므로 유지합니다.
            tracing::warn!(order_id, id = %id, "Active order vanished during delivery, keeping delivered copy");
        }
        Err(delete_err) => {
            // 5. 보상
            tracing::warn!(order_id, id = %id, error = %delete_err, "Failed to remove active order, compensating");
            return match db::orders::delete_delivered(pool, &id).await {
                Ok(_) => Err(delete_err),
                Err(compensation_err) => {
                    tracing::error!(
                        order_id,
                        reconcile = true,
                        id = %id,
                        delete_error = %delete_err,
                        compensation_error = %compensation_err,
                        "Order is now present in both active and delivered collections"
                    );
                    Err(duplicated(order_id, &id))
                }
            };
        }
    }

    tracing::info!(order_id, id = %id, delivered_at = %delivered_at, "Order marked as delivered");
    Ok(DeliveryReceipt {
        message: "Order marked as delivered".to_string(),
        order_id,
        delivered_at,
    })
}

/// 배송 완료 레코드가 이미 있는데 처리 대기 레코드도 남아 있는 경우를 마무리합니다.
///
/// 보상까지 실패한 이전 전환이나, 시간 초과로 보고됐지만 실제로는 기록된 삽입이
/// 이런 상태를 남깁니다. 이미 기록된 배송 완료 레코드를 그대로 두고 4단계만 다시 합니다.
async fn resume_delivery(
    pool: &SqlitePool,
    id: &str,
    order_id: i64,
) -> Result<DeliveryReceipt, AppError> {
    if db::orders::find_order(pool, id).await?.is_none() {
        tracing::info!(order_id, id = %id, "Order was already delivered");
        return Err(AppError::NotFound("Order already delivered".to_string()));
    }

    let delivered_at = db::orders::find_delivered(pool, id)
        .await?
        .and_then(|record| record.delivered_at)
        .ok_or_else(|| {
            AppError::Internal(format!("delivered record for order {} disappeared", order_id))
        })?;

    tracing::warn!(order_id, id = %id, "Order is in both collections, finishing an earlier delivery");
    match db::orders::delete_order(pool, id).await {
        Ok(true) => {
            tracing::info!(order_id, id = %id, delivered_at = %delivered_at, "Order marked as delivered");
            Ok(DeliveryReceipt {
                message: "Order marked as delivered".to_string(),
                order_id,
                delivered_at,
            })
        }
        Ok(false) => Err(AppError::NotFound("Order already delivered".to_string())),
        Err(delete_err) => {
            tracing::error!(
                order_id,
                reconcile = true,
                id = %id,
                delete_error = %delete_err,
                "Order is still present in both active and delivered collections"
            );
            Err(duplicated(order_id, id))
        }
    }
}

fn duplicated(order_id: i64, id: &str) -> AppError {
    AppError::Consistency(format!(
        "order {} ({}) remains in both active and delivered collections",
        order_id, id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::CatalogCache;

    async fn seeded_pool() -> SqlitePool {
        let pool = db::connect_in_memory().await.unwrap();
        CatalogCache::new().load(&pool).await.unwrap();
        pool
    }

    fn jane_order(items: Vec<OrderItem>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: Customer {
                name: "Jane".to_string(),
                email: "jane@example.com".to_string(),
                phone: "555-0100".to_string(),
                address: "1 Main St".to_string(),
            },
            items,
        }
    }

    fn item(product_id: i64, quantity: i64) -> OrderItem {
        OrderItem { product_id, quantity }
    }

    #[tokio::test]
    async fn jane_scenario_totals_against_default_catalog() {
        let pool = seeded_pool().await;
        let seq = Sequencer::new();

        let order = create_order(&pool, &seq, jane_order(vec![item(1, 2), item(3, 1)]))
            .await
            .unwrap();

        assert_eq!(order.total, Decimal::new(2297, 2));
        assert_eq!(order.order_id, 1);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer.name, "Jane");
        assert_eq!(get_order(&pool, &order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn missing_product_counts_as_zero() {
        let pool = seeded_pool().await;

        let order = create_order(&pool, &Sequencer::new(), jane_order(vec![item(2, 3), item(404, 5)]))
            .await
            .unwrap();

        assert_eq!(order.total, Decimal::new(2097, 2));
        assert_eq!(order.items.len(), 2);
    }

    #[tokio::test]
    async fn empty_or_non_positive_items_are_rejected() {
        let pool = seeded_pool().await;
        let seq = Sequencer::new();

        let empty = create_order(&pool, &seq, jane_order(vec![])).await.unwrap_err();
        assert!(matches!(empty, AppError::BadRequest(_)));
        let zero = create_order(&pool, &seq, jane_order(vec![item(1, 0)])).await.unwrap_err();
        assert!(matches!(zero, AppError::BadRequest(_)));
        assert!(list_orders(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sequential_order_ids_increase_by_one() {
        let pool = seeded_pool().await;
        let seq = Sequencer::new();

        let mut ids = Vec::new();
        for _ in 0..4 {
            let order = create_order(&pool, &seq, jane_order(vec![item(1, 1)])).await.unwrap();
            ids.push(order.order_id);
        }

        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn concurrent_creations_get_distinct_ids() {
        let pool = seeded_pool().await;
        let seq = Sequencer::new();

        let (a, b, c) = tokio::join!(
            create_order(&pool, &seq, jane_order(vec![item(1, 1)])),
            create_order(&pool, &seq, jane_order(vec![item(2, 1)])),
            create_order(&pool, &seq, jane_order(vec![item(3, 1)])),
        );

        let mut ids = vec![a.unwrap().order_id, b.unwrap().order_id, c.unwrap().order_id];
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let pool = seeded_pool().await;
        let seq = Sequencer::new();
        for _ in 0..3 {
            create_order(&pool, &seq, jane_order(vec![item(1, 1)])).await.unwrap();
        }

        let listed: Vec<i64> = list_orders(&pool).await.unwrap().iter().map(|o| o.order_id).collect();
        assert_eq!(listed, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn get_order_distinguishes_bad_identity_from_missing() {
        let pool = seeded_pool().await;

        assert!(matches!(get_order(&pool, "1").await, Err(AppError::BadRequest(_))));
        assert!(matches!(
            get_order(&pool, &new_record_id()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delivered_order_moves_between_collections() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let order = create_order(&pool, &Sequencer::new(), jane_order(vec![item(4, 1)]))
            .await
            .unwrap();

        let receipt = mark_delivered(&pool, &lock, &order.id).await.unwrap();

        assert_eq!(receipt.order_id, order.order_id);
        assert!(receipt.delivered_at >= order.created_at);
        assert!(list_orders(&pool).await.unwrap().is_empty());
        let delivered = list_delivered(&pool).await.unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, order.id);
        assert_eq!(delivered[0].status, OrderStatus::Delivered);
        assert_eq!(delivered[0].delivered_at.as_deref(), Some(receipt.delivered_at.as_str()));
        assert_eq!(delivered[0].total, order.total);

        // Retrying after success reports NotFound, not BadRequest.
        assert!(matches!(
            mark_delivered(&pool, &lock, &order.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delivered_listing_is_newest_delivery_first() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let seq = Sequencer::new();
        let first = create_order(&pool, &seq, jane_order(vec![item(1, 1)])).await.unwrap();
        let second = create_order(&pool, &seq, jane_order(vec![item(1, 1)])).await.unwrap();

        mark_delivered(&pool, &lock, &second.id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        mark_delivered(&pool, &lock, &first.id).await.unwrap();

        let order_ids: Vec<i64> = list_delivered(&pool).await.unwrap().iter().map(|o| o.order_id).collect();
        assert_eq!(order_ids, vec![first.order_id, second.order_id]);
    }

    #[tokio::test]
    async fn delivered_numbers_are_not_reused() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let seq = Sequencer::new();
        let first = create_order(&pool, &seq, jane_order(vec![item(1, 1)])).await.unwrap();
        mark_delivered(&pool, &lock, &first.id).await.unwrap();

        let next = create_order(&pool, &seq, jane_order(vec![item(1, 1)])).await.unwrap();
        assert_eq!(next.order_id, 2);
    }

    #[tokio::test]
    async fn concurrent_delivery_succeeds_at_most_once() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let order = create_order(&pool, &Sequencer::new(), jane_order(vec![item(5, 1)]))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            mark_delivered(&pool, &lock, &order.id),
            mark_delivered(&pool, &lock, &order.id)
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = if a.is_err() { a } else { b };
        assert!(matches!(failure, Err(AppError::NotFound(_))));
        assert_eq!(list_delivered(&pool).await.unwrap().len(), 1);
        assert!(list_orders(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_active_delete_is_compensated() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let order = create_order(&pool, &Sequencer::new(), jane_order(vec![item(6, 2)]))
            .await
            .unwrap();
        sqlx::query(
            "CREATE TRIGGER refuse_active_delete BEFORE DELETE ON orders
             BEGIN SELECT RAISE(ABORT, 'active delete refused'); END;",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = mark_delivered(&pool, &lock, &order.id).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(db::orders::find_order(&pool, &order.id).await.unwrap().is_some());
        assert!(db::orders::find_delivered(&pool, &order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_compensation_is_a_consistency_error() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let order = create_order(&pool, &Sequencer::new(), jane_order(vec![item(7, 1)]))
            .await
            .unwrap();
        refuse_deletes(&pool, &["orders", "delivered_orders"]).await;

        let err = mark_delivered(&pool, &lock, &order.id).await.unwrap_err();

        assert!(matches!(err, AppError::Consistency(_)));
        // The order is duplicated, never lost.
        assert!(db::orders::find_order(&pool, &order.id).await.unwrap().is_some());
        assert!(db::orders::find_delivered(&pool, &order.id).await.unwrap().is_some());
    }

    async fn refuse_deletes(pool: &SqlitePool, tables: &[&str]) {
        for table in tables {
            sqlx::query(&format!(
                "CREATE TRIGGER refuse_{table}_delete BEFORE DELETE ON {table}
                 BEGIN SELECT RAISE(ABORT, 'delete refused'); END;"
            ))
            .execute(pool)
            .await
            .unwrap();
        }
    }

    async fn allow_deletes(pool: &SqlitePool, tables: &[&str]) {
        for table in tables {
            sqlx::query(&format!("DROP TRIGGER refuse_{table}_delete"))
                .execute(pool)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn retry_after_consistency_error_finishes_the_move() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let order = create_order(&pool, &Sequencer::new(), jane_order(vec![item(8, 1)]))
            .await
            .unwrap();
        refuse_deletes(&pool, &["orders", "delivered_orders"]).await;
        let err = mark_delivered(&pool, &lock, &order.id).await.unwrap_err();
        assert!(matches!(err, AppError::Consistency(_)));
        let stranded = db::orders::find_delivered(&pool, &order.id).await.unwrap().unwrap();

        allow_deletes(&pool, &["orders", "delivered_orders"]).await;
        let receipt = mark_delivered(&pool, &lock, &order.id).await.unwrap();

        assert_eq!(receipt.order_id, order.order_id);
        assert_eq!(Some(receipt.delivered_at), stranded.delivered_at);
        assert!(list_orders(&pool).await.unwrap().is_empty());
        assert_eq!(list_delivered(&pool).await.unwrap().len(), 1);
        assert!(matches!(
            mark_delivered(&pool, &lock, &order.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stranded_duplicate_stays_a_consistency_error_until_removable() {
        let pool = seeded_pool().await;
        let lock = DeliveryLock::new();
        let order = create_order(&pool, &Sequencer::new(), jane_order(vec![item(8, 2)]))
            .await
            .unwrap();
        refuse_deletes(&pool, &["orders", "delivered_orders"]).await;
        mark_delivered(&pool, &lock, &order.id).await.unwrap_err();
        allow_deletes(&pool, &["delivered_orders"]).await;

        let err = mark_delivered(&pool, &lock, &order.id).await.unwrap_err();

        assert!(matches!(err, AppError::Consistency(_)));
        assert_eq!(list_orders(&pool).await.unwrap().len(), 1);
        assert_eq!(list_delivered(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oversized_total_is_rejected_instead_of_overflowing() {
        let pool = seeded_pool().await;
        let seq = Sequencer::new();
        let pricey = crate::services::catalog::create_product(
            &pool,
            &seq,
            &CatalogCache::new(),
            CreateProductRequest {
                name: "Gold Cake".to_string(),
                description: String::new(),
                price: Decimal::MAX,
                image: None,
                category: "Cakes".to_string(),
            },
        )
        .await
        .unwrap();

        let doubled = create_order(&pool, &seq, jane_order(vec![item(pricey.product_id, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(doubled, AppError::BadRequest(ref msg) if msg == "Order total is too large"));

        let summed = create_order(
            &pool,
            &seq,
            jane_order(vec![item(pricey.product_id, 1), item(pricey.product_id, 1)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(summed, AppError::BadRequest(_)));
        assert!(list_orders(&pool).await.unwrap().is_empty());
    }
}
