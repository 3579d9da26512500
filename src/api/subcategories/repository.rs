use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::schema::catalog::{CatalogChanges, CatalogStatus, NewCatalogEntry, Subcategory};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait SubcategoryRepository: Send + Sync {
    async fn list_for_category(&self, category_id: Uuid)
    -> Result<Vec<Subcategory>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, RepositoryError>;
    /// Name clash among the category's non-deleted subcategories.
    async fn name_exists(
        &self,
        category_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, RepositoryError>;
    async fn create(
        &self,
        category_id: Uuid,
        entry: NewCatalogEntry,
    ) -> Result<Subcategory, RepositoryError>;
    async fn update(
        &self,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Subcategory, RepositoryError>;
    async fn soft_delete(&self, id: Uuid) -> Result<Subcategory, RepositoryError>;
}

pub struct PgSubcategoryRepository {
    pool: PgPool,
}

impl PgSubcategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubcategoryRepository for PgSubcategoryRepository {
    async fn list_for_category(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<Subcategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, Subcategory>(
            "SELECT * FROM subcategories
             WHERE category_id = $1 AND deleted_at IS NULL AND status <> 'deleted'
             ORDER BY name",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, RepositoryError> {
        let row = sqlx::query_as::<_, Subcategory>("SELECT * FROM subcategories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn name_exists(
        &self,
        category_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM subcategories
                WHERE category_id = $1 AND LOWER(name) = LOWER($2)
                  AND deleted_at IS NULL AND status <> 'deleted'
                  AND ($3::uuid IS NULL OR id <> $3)
             )",
        )
        .bind(category_id)
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(
        &self,
        category_id: Uuid,
        entry: NewCatalogEntry,
    ) -> Result<Subcategory, RepositoryError> {
        let row = sqlx::query_as::<_, Subcategory>(
            "INSERT INTO subcategories (id, category_id, name, description, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(entry.name)
        .bind(entry.description)
        .bind(entry.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Subcategory, RepositoryError> {
        let row = sqlx::query_as::<_, Subcategory>(
            "UPDATE subcategories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Subcategory, RepositoryError> {
        let row = sqlx::query_as::<_, Subcategory>(
            "UPDATE subcategories SET status = $2, deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(CatalogStatus::Deleted)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
