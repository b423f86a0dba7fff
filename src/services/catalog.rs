//! # 상품 카탈로그 캐시
//!
//! 상품 컬렉션을 메모리에 복제해 두고 고객용 목록 조회에 사용합니다.
//! 저장소가 항상 원본(source of truth)이며, 캐시는 읽기 편의를 위한 사본입니다.
//!
//! ## 흐름
//! ```text
//! 시작 시 load()  ── 저장소가 비어 있으면 기본 상품 8개를 저장소와 캐시에 기록
//! 상품 생성       ── 저장소 삽입 성공 후 append()
//! 상품 수정/삭제  ── 저장소 반영 성공 후 replace() / remove()
//! ```
//! 주문 합계 계산에는 캐시를 쓰지 않습니다 (`services::orders` 참고).

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::db;
use crate::error::AppError;
use crate::models::{now_timestamp, CreateProductRequest, Product, UpdateProductRequest, DEFAULT_IMAGE};
use crate::services::{new_record_id, parse_record_id};
use crate::services::sequence::{IdKind, Sequencer};

/// 기본 상품 목록: (productId, 이름, 설명, 가격(센트), 이미지, 분류)
const DEFAULT_CATALOG: [(i64, &str, &str, i64, &str, &str); 8] = [
    (1, "Chocolate Chip Cookies", "Freshly baked cookies with premium chocolate chips", 899, "🍪", "Cookies"),
    (2, "Blueberry Muffins", "Moist muffins bursting with fresh blueberries", 699, "🧁", "Muffins"),
    (3, "Croissant", "Buttery, flaky French croissant", 499, "🥐", "Pastries"),
    (4, "Chocolate Cake", "Rich chocolate layer cake with buttercream frosting", 2499, "🎂", "Cakes"),
    (5, "Apple Pie", "Homemade apple pie with cinnamon", 1899, "🥧", "Pies"),
    (6, "Bagels", "Fresh New York style bagels (pack of 6)", 799, "🥯", "Breads"),
    (7, "Cinnamon Roll", "Warm cinnamon rolls with cream cheese glaze", 599, "🍩", "Pastries"),
    (8, "Strawberry Tart", "Delicate tart with fresh strawberries", 1299, "🍓", "Tarts"),
];

/// 기본 상품 목록을 새 record identity와 함께 만듭니다.
pub fn default_catalog() -> Vec<Product> {
    let created_at = now_timestamp();
    DEFAULT_CATALOG
        .iter()
        .map(|&(product_id, name, description, cents, image, category)| Product {
            id: new_record_id(),
            product_id,
            name: name.to_string(),
            description: description.to_string(),
            price: Decimal::new(cents, 2),
            image: image.to_string(),
            category: category.to_string(),
            created_at: created_at.clone(),
        })
        .collect()
}

/// 상품 컬렉션의 메모리 사본
///
/// 쓰기는 생성/수정/삭제 경로에서만, 읽기는 여러 요청이 동시에 합니다.
#[derive(Debug, Default)]
pub struct CatalogCache {
    products: RwLock<Vec<Product>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장소의 상품으로 캐시를 채웁니다.
    ///
    /// 저장소가 비어 있으면 기본 상품을 저장소에 기록한 뒤 캐시에 넣습니다.
    /// 비어 있지 않으면 저장소 내용을 그대로 복제만 하므로 여러 번 호출해도 안전합니다.
    /// 반환값은 캐시된 상품 수입니다.
    pub async fn load(&self, pool: &SqlitePool) -> Result<usize, AppError> {
        let mut products = db::products::list_products(pool).await?;

        if products.is_empty() {
            tracing::info!("Product store is empty, seeding default catalog");
            products = default_catalog();
            for product in &products {
                db::products::insert_product(pool, product).await?;
            }
        }

        let count = products.len();
        *self.products.write().await = products;
        tracing::info!(count, "Catalog cache loaded");
        Ok(count)
    }

    pub async fn list(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    /// 저장소에 새로 기록된 상품을 캐시 끝에 추가합니다.
    pub async fn append(&self, product: Product) {
        self.products.write().await.push(product);
    }

    /// 같은 record identity의 상품을 교체합니다. 캐시에 없으면 추가합니다.
    pub async fn replace(&self, product: Product) {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => *slot = product,
            None => products.push(product),
        }
    }

    pub async fn remove(&self, id: &str) {
        self.products.write().await.retain(|p| p.id != id);
    }
}

fn validate_new_product(req: &CreateProductRequest) -> Result<(), AppError> {
    if req.name.trim().is_empty() || req.category.trim().is_empty() || req.price <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Name, category, and valid price are required".to_string(),
        ));
    }
    Ok(())
}

fn validate_update(req: &UpdateProductRequest) -> Result<(), AppError> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }
    if req.category.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(AppError::BadRequest("Category must not be empty".to_string()));
    }
    if req.price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::BadRequest("Price must be greater than zero".to_string()));
    }
    Ok(())
}

/// 상품을 생성합니다: 검증 → productId 발급 → 저장 → 캐시 추가
pub async fn create_product(
    pool: &SqlitePool,
    sequencer: &Sequencer,
    cache: &CatalogCache,
    req: CreateProductRequest,
) -> Result<Product, AppError> {
    validate_new_product(&req)?;

    let ticket = sequencer.reserve(pool, IdKind::Product).await?;
    let product = Product {
        id: new_record_id(),
        product_id: ticket.id,
        name: req.name.trim().to_string(),
        description: req.description,
        price: req.price,
        image: req
            .image
            .filter(|image| !image.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        category: req.category.trim().to_string(),
        created_at: now_timestamp(),
    };
    db::products::insert_product(pool, &product).await?;
    drop(ticket);

    cache.append(product.clone()).await;
    tracing::info!(product_id = product.product_id, id = %product.id, "Product created");
    Ok(product)
}

/// 상품의 일부 필드를 수정합니다. productId와 생성 시각은 바뀌지 않습니다.
pub async fn update_product(
    pool: &SqlitePool,
    cache: &CatalogCache,
    raw_id: &str,
    req: UpdateProductRequest,
) -> Result<Product, AppError> {
    let id = parse_record_id(raw_id, "product")?;
    validate_update(&req)?;

    let mut product = db::products::find_by_id(pool, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    req.apply(&mut product);

    if !db::products::update_product(pool, &product).await? {
        return Err(AppError::not_found("Product"));
    }

    cache.replace(product.clone()).await;
    tracing::info!(product_id = product.product_id, "Product updated");
    Ok(product)
}

pub async fn delete_product(
    pool: &SqlitePool,
    cache: &CatalogCache,
    raw_id: &str,
) -> Result<(), AppError> {
    let id = parse_record_id(raw_id, "product")?;

    if !db::products::delete_product(pool, &id).await? {
        return Err(AppError::not_found("Product"));
    }

    cache.remove(&id).await;
    tracing::info!(id = %id, "Product deleted");
    Ok(())
}

/// `GET /api/products/{id}`의 조회 규칙: UUID면 record identity, 정수면 productId로 찾습니다.
/// 둘 다 아니면 찾을 수 없는 것으로 처리합니다.
pub async fn find_product(pool: &SqlitePool, raw_id: &str) -> Result<Product, AppError> {
    let found = if let Ok(id) = parse_record_id(raw_id, "product") {
        db::products::find_by_id(pool, &id).await?
    } else if let Ok(product_id) = raw_id.trim().parse::<i64>() {
        db::products::find_by_product_id(pool, product_id).await?
    } else {
        None
    };

    found.ok_or_else(|| AppError::not_found("Product"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, cents: i64) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(cents, 2),
            image: None,
            category: "Breads".to_string(),
        }
    }

    #[tokio::test]
    async fn load_seeds_an_empty_store_once() {
        let pool = db::connect_in_memory().await.unwrap();
        let cache = CatalogCache::new();

        assert_eq!(cache.load(&pool).await.unwrap(), 8);
        assert_eq!(db::products::list_products(&pool).await.unwrap().len(), 8);

        // Second load only mirrors what is stored.
        let again = CatalogCache::new();
        assert_eq!(again.load(&pool).await.unwrap(), 8);
        assert_eq!(db::products::list_products(&pool).await.unwrap().len(), 8);
        assert_eq!(again.list().await, db::products::list_products(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn product_ids_continue_after_defaults() {
        let pool = db::connect_in_memory().await.unwrap();
        let cache = CatalogCache::new();
        let sequencer = Sequencer::new();
        cache.load(&pool).await.unwrap();

        let first = create_product(&pool, &sequencer, &cache, new_product("Rye", 550))
            .await
            .unwrap();
        let second = create_product(&pool, &sequencer, &cache, new_product("Sourdough", 650))
            .await
            .unwrap();

        assert_eq!(first.product_id, 9);
        assert_eq!(second.product_id, 10);
        assert_eq!(first.image, DEFAULT_IMAGE);
        assert_eq!(cache.len().await, 10);
    }

    #[tokio::test]
    async fn create_rejects_non_positive_price() {
        let pool = db::connect_in_memory().await.unwrap();
        let cache = CatalogCache::new();

        let err = create_product(&pool, &Sequencer::new(), &cache, new_product("Free", 0))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn update_and_delete_keep_cache_in_step() {
        let pool = db::connect_in_memory().await.unwrap();
        let cache = CatalogCache::new();
        cache.load(&pool).await.unwrap();
        let croissant = find_product(&pool, "3").await.unwrap();

        let updated = update_product(
            &pool,
            &cache,
            &croissant.id,
            UpdateProductRequest {
                price: Some(Decimal::new(549, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price, Decimal::new(549, 2));
        assert_eq!(updated.name, "Croissant");
        let cached = cache.list().await;
        assert!(cached.iter().any(|p| p.id == croissant.id && p.price == updated.price));

        delete_product(&pool, &cache, &croissant.id).await.unwrap();
        assert_eq!(cache.len().await, 7);
        assert!(matches!(
            find_product(&pool, &croissant.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_product(&pool, &cache, &croissant.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn lookup_accepts_record_identity_or_product_id() {
        let pool = db::connect_in_memory().await.unwrap();
        CatalogCache::new().load(&pool).await.unwrap();

        let by_number = find_product(&pool, "1").await.unwrap();
        assert_eq!(by_number.name, "Chocolate Chip Cookies");
        let by_identity = find_product(&pool, &by_number.id).await.unwrap();
        assert_eq!(by_identity, by_number);
        assert!(matches!(find_product(&pool, "cookies").await, Err(AppError::NotFound(_))));
        assert!(matches!(find_product(&pool, "99").await, Err(AppError::NotFound(_))));
    }
}
