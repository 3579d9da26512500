use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::schema::catalog::{Product, StockChange};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Sets the stock level under a row lock. A log row is written only when
    /// the level actually changes. `None` when the product does not exist.
    async fn set_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
        reason: &str,
    ) -> Result<Option<(Product, Option<StockChange>)>, RepositoryError>;
    async fn history(&self, product_id: Uuid) -> Result<Vec<StockChange>, RepositoryError>;
}

pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn set_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
        reason: &str,
    ) -> Result<Option<(Product, Option<StockChange>)>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };

        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET quantity = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        let change = if previous != quantity {
            let row = sqlx::query_as::<_, StockChange>(
                "INSERT INTO stock_changes (id, product_id, previous_quantity, quantity, reason)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING *",
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(previous)
            .bind(quantity)
            .bind(reason)
            .fetch_one(&mut *tx)
            .await?;
            Some(row)
        } else {
            None
        };

        tx.commit().await?;
        Ok(Some((product, change)))
    }

    async fn history(&self, product_id: Uuid) -> Result<Vec<StockChange>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockChange>(
            "SELECT * FROM stock_changes WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
