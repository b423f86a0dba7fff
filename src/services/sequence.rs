//! productId / orderId allocation.
//!
//! The store query alone (`db::sequence`) reads the current maximum and adds
//! one, so two concurrent creations could compute the same number. Every
//! creation path therefore takes a [`Ticket`] and keeps it alive until its
//! insert has finished: the ticket holds a per-kind mutex, making this process
//! the single writer of each sequence. The unique indexes on
//! `products.product_id` and `orders.order_id` reject anything that slips past
//! (for example a second process pointed at the same database).

use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard};

use crate::db;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Product,
    Order,
}

#[derive(Debug, Default)]
pub struct Sequencer {
    products: Mutex<()>,
    orders: Mutex<()>,
}

/// An allocated identifier plus the right to insert it.
#[derive(Debug)]
pub struct Ticket<'a> {
    pub id: i64,
    _guard: MutexGuard<'a, ()>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier of `kind` as currently visible in the store, without
    /// reserving it.
    pub async fn next(&self, pool: &SqlitePool, kind: IdKind) -> Result<i64, AppError> {
        match kind {
            IdKind::Product => db::sequence::next_product_id(pool).await,
            IdKind::Order => db::sequence::next_order_id(pool).await,
        }
    }

    /// Waits for exclusive use of the `kind` sequence and computes the next
    /// identifier. Nothing is assigned if the query fails.
    pub async fn reserve(&self, pool: &SqlitePool, kind: IdKind) -> Result<Ticket<'_>, AppError> {
        let guard = match kind {
            IdKind::Product => self.products.lock().await,
            IdKind::Order => self.orders.lock().await,
        };
        let id = self.next(pool, kind).await?;
        Ok(Ticket { id, _guard: guard })
    }
}
