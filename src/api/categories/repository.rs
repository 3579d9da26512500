use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::schema::catalog::{
    CatalogChanges, CatalogStatus, Category, CategoryWithSubcategories, NewCatalogEntry,
    Subcategory,
};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Non-deleted categories, each with its non-deleted subcategories.
    async fn list(&self) -> Result<Vec<CategoryWithSubcategories>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError>;
    /// Name clash among non-deleted categories, ignoring `except`.
    async fn name_exists(&self, name: &str, except: Option<Uuid>) -> Result<bool, RepositoryError>;
    async fn create(&self, entry: NewCatalogEntry) -> Result<Category, RepositoryError>;
    async fn update(&self, id: Uuid, changes: CatalogChanges) -> Result<Category, RepositoryError>;
    async fn soft_delete(&self, id: Uuid) -> Result<Category, RepositoryError>;
}

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self) -> Result<Vec<CategoryWithSubcategories>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories
             WHERE deleted_at IS NULL AND status <> 'deleted'
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let subcategories = sqlx::query_as::<_, Subcategory>(
            "SELECT * FROM subcategories
             WHERE deleted_at IS NULL AND status <> 'deleted'
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories
            .into_iter()
            .map(|category| {
                let subcategories = subcategories
                    .iter()
                    .filter(|s| s.category_id == category.id)
                    .cloned()
                    .collect();
                CategoryWithSubcategories {
                    category,
                    subcategories,
                }
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn name_exists(&self, name: &str, except: Option<Uuid>) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE LOWER(name) = LOWER($1)
                  AND deleted_at IS NULL AND status <> 'deleted'
                  AND ($2::uuid IS NULL OR id <> $2)
             )",
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, entry: NewCatalogEntry) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description, status)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(entry.name)
        .bind(entry.description)
        .bind(entry.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: CatalogChanges) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            "UPDATE categories SET
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

    async fn soft_delete(&self, id: Uuid) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            "UPDATE categories SET status = $2, deleted_at = NOW(), updated_at = NOW()
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
