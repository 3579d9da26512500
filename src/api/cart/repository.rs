use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::conflict_on_unique;
use crate::schema::commerce::CartItem;
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CartItem>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CartItem>, RepositoryError>;
    async fn find_by_user_and_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, RepositoryError>;
    /// `Conflict` when the pair already has a row.
    async fn create(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError>;
    async fn update_quantity(&self, id: Uuid, quantity: i32) -> Result<CartItem, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// Returns how many rows were removed.
    async fn clear(&self, user_id: Uuid) -> Result<u64, RepositoryError>;
}

pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItem>(
            "SELECT * FROM cart_items WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_user_and_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItem>(
            "SELECT * FROM cart_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items (id, user_id, product_id, quantity)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Product already in cart"))
    }

    async fn update_quantity(&self, id: Uuid, quantity: i32) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
