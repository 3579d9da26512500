use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::schema::commerce::{NewOrder, Order, OrderRow, OrderStatus};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Decrements stock for every item, inserts the order and empties the
    /// user's cart as one unit. `InsufficientStock` rolls the whole thing back.
    async fn place(&self, order: NewOrder) -> Result<Order, RepositoryError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError>;
    /// Compare-and-set on status; `Stale` if it moved away from `expected`.
    async fn transition(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError>;
}

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn place(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // lock rows in id order so concurrent orders cannot deadlock
        let mut lock_order: Vec<_> = order.items.iter().collect();
        lock_order.sort_by_key(|item| item.product_id);

        for item in lock_order {
            let updated = sqlx::query(
                "UPDATE products SET quantity = quantity - $1, updated_at = NOW()
                 WHERE id = $2 AND quantity >= $1
                   AND status = 'active' AND deleted_at IS NULL",
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // dropping tx rolls back earlier decrements
                return Err(RepositoryError::InsufficientStock(item.product_id));
            }
        }

        let row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (id, user_id, items, total, status)
             VALUES ($1, $2, $3, $4, 'pending')
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(order.total)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(order.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING *",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into)
            .ok_or_else(|| RepositoryError::Stale("Order status changed, retry".to_string()))
    }
}
