use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::CategoryRepository;
use crate::schema::catalog::{
    CatalogChanges, CatalogStatus, Category, CategoryWithSubcategories, NewCatalogEntry,
};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

const NAME_TAKEN: &str = "Category with this name already exists";

pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    fn missing(id: Uuid) -> AppError {
        AppError::not_found(format!("Category with ID \"{id}\" not found"))
    }

    /// Any row, deleted included; mutations decide what a deleted row means.
    async fn existing(&self, id: Uuid) -> Result<Category, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::missing(id))
    }

    /// Existing and not deleted, else Conflict with `message`.
    async fn mutable(&self, id: Uuid, message: &str) -> Result<Category, AppError> {
        let category = self.existing(id).await?;
        if category.is_deleted() {
            return Err(AppError::conflict(message));
        }
        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<CategoryWithSubcategories>, AppError> {
        let categories = self.repo.list().await?;
        debug!(count = categories.len(), "categories listed");
        Ok(categories)
    }

    pub async fn get(&self, id: Uuid) -> Result<Category, AppError> {
        let category = self.existing(id).await?;
        if category.is_deleted() {
            return Err(Self::missing(id));
        }
        Ok(category)
    }

    pub async fn create(&self, entry: NewCatalogEntry) -> Result<Category, AppError> {
        if self.repo.name_exists(&entry.name, None).await? {
            return Err(AppError::conflict(NAME_TAKEN));
        }
        let category = self.repo.create(entry).await?;
        info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn update(&self, id: Uuid, changes: CatalogChanges) -> Result<Category, AppError> {
        self.mutable(id, "Cannot update a deleted category").await?;
        if let Some(name) = changes.name.as_deref() {
            if self.repo.name_exists(name, Some(id)).await? {
                return Err(AppError::conflict(NAME_TAKEN));
            }
        }
        let category = self.repo.update(id, changes).await?;
        info!(category_id = %id, "category updated");
        Ok(category)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Category, AppError> {
        self.mutable(id, "Category already deleted").await?;
        let category = self.repo.soft_delete(id).await?;
        info!(category_id = %id, "category deleted");
        Ok(category)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<Category, AppError> {
        self.mutable(id, "Cannot deactivate a deleted category").await?;
        self.set_status(id, CatalogStatus::Inactive).await
    }

    pub async fn activate(&self, id: Uuid) -> Result<Category, AppError> {
        self.mutable(id, "Cannot activate a deleted category").await?;
        self.set_status(id, CatalogStatus::Active).await
    }

    async fn set_status(&self, id: Uuid, status: CatalogStatus) -> Result<Category, AppError> {
        let category = self
            .repo
            .update(
                id,
                CatalogChanges {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;
        info!(category_id = %id, ?status, "category status changed");
        Ok(category)
    }
}
