//! # 상품 데이터베이스 쿼리 모듈
//!
//! `products` 테이블에 대한 조회/삽입/수정/삭제 쿼리입니다.
//! 가격은 소수점 오차를 피하기 위해 TEXT로 저장합니다.

use crate::db::bounded;
use crate::error::AppError;
use crate::models::Product;
use sqlx::SqlitePool;

/// 모든 상품을 productId 오름차순으로 조회합니다.
pub async fn list_products(pool: &SqlitePool) -> Result<Vec<Product>, AppError> {
    bounded(
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, product_id, name, description, price, image, category, created_at
            FROM products
            ORDER BY product_id ASC
            "#,
        )
        .fetch_all(pool),
    )
    .await
}

/// record identity로 상품 하나를 조회합니다.
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Product>, AppError> {
    bounded(
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, product_id, name, description, price, image, category, created_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool),
    )
    .await
}

/// 사람이 읽는 productId로 상품 하나를 조회합니다.
///
/// 주문 합계 계산은 캐시가 아니라 항상 이 함수로 저장소의 현재 가격을 읽습니다.
pub async fn find_by_product_id(
    pool: &SqlitePool,
    product_id: i64,
) -> Result<Option<Product>, AppError> {
    bounded(
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, product_id, name, description, price, image, category, created_at
            FROM products
            WHERE product_id = ?
            "#,
        )
        .bind(product_id)
        .fetch_optional(pool),
    )
    .await
}

pub async fn insert_product(pool: &SqlitePool, product: &Product) -> Result<(), AppError> {
    bounded(
        sqlx::query(
            r#"
            INSERT INTO products (id, product_id, name, description, price, image, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(product.product_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.image)
        .bind(&product.category)
        .bind(&product.created_at)
        .execute(pool),
    )
    .await?;

    Ok(())
}

/// 상품의 수정 가능한 필드를 덮어씁니다.
///
/// ## 반환값
/// - `Ok(true)`: 수정됨
/// - `Ok(false)`: 해당 ID의 상품이 없음
pub async fn update_product(pool: &SqlitePool, product: &Product) -> Result<bool, AppError> {
    let result = bounded(
        sqlx::query(
            r#"
            UPDATE products
            SET name = ?, description = ?, price = ?, image = ?, category = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.image)
        .bind(&product.category)
        .bind(&product.id)
        .execute(pool),
    )
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_product(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = bounded(
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(pool),
    )
    .await?;

    Ok(result.rows_affected() > 0)
}
