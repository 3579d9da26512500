use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::schema::models::{Address, AddressChanges, NewAddress};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Inserts the address; a default one first clears the user's other defaults.
    async fn create(&self, user_id: Uuid, address: NewAddress) -> Result<Address, RepositoryError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Address>, RepositoryError>;
    /// Includes soft-deleted rows; callers decide visibility.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Address>, RepositoryError>;
    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: AddressChanges,
    ) -> Result<Address, RepositoryError>;
    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn clear_defaults(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn create(&self, user_id: Uuid, a: NewAddress) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if a.is_default {
            clear_defaults(&mut tx, user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(
            "INSERT INTO addresses (
                id, user_id, first_name, last_name, phone, street, address_line2,
                city, state, country, zip_code, latitude, longitude, address_type,
                is_default, delivery_instructions, label
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(a.first_name)
        .bind(a.last_name)
        .bind(a.phone)
        .bind(a.street)
        .bind(a.address_line2)
        .bind(a.city)
        .bind(a.state)
        .bind(a.country)
        .bind(a.zip_code)
        .bind(a.latitude)
        .bind(a.longitude)
        .bind(a.address_type)
        .bind(a.is_default)
        .bind(a.delivery_instructions)
        .bind(a.label)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, Address>(
            "SELECT * FROM addresses
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY is_default DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        c: AddressChanges,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if c.is_default == Some(true) {
            clear_defaults(&mut tx, user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(
            "UPDATE addresses SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                street = COALESCE($5, street),
                address_line2 = COALESCE($6, address_line2),
                city = COALESCE($7, city),
                state = COALESCE($8, state),
                country = COALESCE($9, country),
                zip_code = COALESCE($10, zip_code),
                latitude = COALESCE($11, latitude),
                longitude = COALESCE($12, longitude),
                address_type = COALESCE($13, address_type),
                is_default = COALESCE($14, is_default),
                delivery_instructions = COALESCE($15, delivery_instructions),
                label = COALESCE($16, label),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(c.first_name)
        .bind(c.last_name)
        .bind(c.phone)
        .bind(c.street)
        .bind(c.address_line2)
        .bind(c.city)
        .bind(c.state)
        .bind(c.country)
        .bind(c.zip_code)
        .bind(c.latitude)
        .bind(c.longitude)
        .bind(c.address_type)
        .bind(c.is_default)
        .bind(c.delivery_instructions)
        .bind(c.label)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE addresses SET deleted_at = NOW(), is_default = FALSE, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
