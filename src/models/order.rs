//! # 주문 모델 정의
//!
//! 주문은 두 컬렉션 중 정확히 한 곳에 존재합니다.
//! ```text
//! orders (status = pending) ──mark delivered──▶ delivered_orders (status = delivered, delivered_at 기록)
//! ```
//! 고객(Customer)과 주문 항목(OrderItem)은 독립된 식별자가 없는 값 타입이며
//! 주문 행 안에 JSON으로 함께 저장됩니다.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, Row};

use super::decode_decimal;

/// 주문자 정보: 주문에 포함되어 저장되며 따로 저장되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// 주문 항목: 상품을 소유하지 않고 `productId`로 참조만 합니다.
/// 상품이 나중에 삭제되어도 주문 항목은 그대로 남습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// 주문 엔티티: `orders` 또는 `delivered_orders` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// record identity (UUIDv7). 두 컬렉션 사이를 이동해도 바뀌지 않습니다.
    pub id: String,
    /// 사람이 읽는 주문 번호 (1, 2, 3, ...)
    pub order_id: i64,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    /// 생성 시점의 상품 가격으로 계산한 합계. 이후 가격이 바뀌어도 변하지 않습니다.
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: String,
    /// 배송 완료로 전환된 뒤에만 값이 있습니다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
}

impl Order {
    /// 같은 필드에 상태와 배송 완료 시각만 바꾼 레코드를 만듭니다.
    pub fn into_delivered(self, delivered_at: String) -> Self {
        Self {
            status: OrderStatus::Delivered,
            delivered_at: Some(delivered_at),
            ..self
        }
    }
}

// #[derive(FromRow)] 대신 직접 구현합니다: 상태 문자열 파싱, JSON 컬럼, TEXT 10진수,
// 그리고 테이블에 따라 있거나 없는 delivered_at 컬럼을 처리해야 하기 때문입니다.
// 'r: row를 빌려오는 동안만 유효한 라이프타임
impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        // Json(customer) 패턴으로 래퍼를 벗겨 안쪽 값만 꺼냅니다.
        let Json(customer) = row.try_get::<Json<Customer>, _>("customer")?;
        let Json(items) = row.try_get::<Json<Vec<OrderItem>>, _>("items")?;

        // orders 테이블에는 delivered_at 컬럼이 없습니다.
        let delivered_at = match row.try_get::<Option<String>, _>("delivered_at") {
            Ok(value) => value,
            Err(sqlx::Error::ColumnNotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            customer,
            items,
            total: decode_decimal(row, "total")?,
            status,
            created_at: row.try_get("created_at")?,
            delivered_at,
        })
    }
}

/// 주문 생성 요청: `POST /api/orders`의 요청 본문
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// 배송 완료 전환 결과: `POST /api/orders/{id}/deliver`의 응답
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub message: String,
    pub order_id: i64,
    pub delivered_at: String,
}
