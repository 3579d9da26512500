use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::conflict_on_unique;
use crate::schema::commerce::{NewPayment, Payment, PaymentStatus};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, RepositoryError>;
    async fn find_by_order(&self, order_id: Uuid) -> Result<Option<Payment>, RepositoryError>;
    /// Payments on orders owned by `user_id`.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>, RepositoryError>;
    /// Inserts the payment and, when `order_status` is set, moves the still
    /// pending order in the same transaction.
    async fn create(&self, payment: NewPayment) -> Result<Payment, RepositoryError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment, RepositoryError>;
}

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_order(&self, order_id: Uuid) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>, RepositoryError> {
        let rows = sqlx::query_as::<_, Payment>(
            "SELECT p.* FROM payments p
             JOIN orders o ON o.id = p.order_id
             WHERE o.user_id = $1
             ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, p: NewPayment) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, order_id, amount, method, status, transaction_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(p.order_id)
        .bind(p.amount)
        .bind(p.method)
        .bind(p.status)
        .bind(&p.transaction_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Payment already exists for this order"))?;

        if let Some(next) = p.order_status {
            let moved = sqlx::query(
                "UPDATE orders SET status = $2, updated_at = NOW()
                 WHERE id = $1 AND status = 'pending'",
            )
            .bind(p.order_id)
            .bind(next)
            .execute(&mut *tx)
            .await?;
            if moved.rows_affected() == 0 {
                return Err(RepositoryError::Stale(
                    "Order is no longer pending".to_string(),
                ));
            }
        }

        tx.commit().await?;
        Ok(payment)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
