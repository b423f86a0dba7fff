use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use super::decode_decimal;

/// Placeholder used when a product is created without an image.
pub const DEFAULT_IMAGE: &str = "/images/default.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Record identity (UUIDv7), distinct from `product_id`.
    pub id: String,
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// URL, data URI or a short symbolic placeholder such as an emoji.
    pub image: String,
    pub category: String,
    pub created_at: String,
}

// 가격은 TEXT 컬럼이라 decode_decimal로 직접 읽어야 하므로 FromRow를 손으로 구현합니다.
impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: decode_decimal(row, "price")?,
            image: row.try_get("image")?,
            category: row.try_get("category")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: String,
}

/// Partial update: absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category: Option<String>,
}

impl UpdateProductRequest {
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
    }
}
