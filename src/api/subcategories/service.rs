use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::SubcategoryRepository;
use crate::api::categories::repository::CategoryRepository;
use crate::schema::catalog::{CatalogChanges, CatalogStatus, NewCatalogEntry, Subcategory};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

const NOT_FOUND: &str = "Subcategory not found";
const NAME_TAKEN: &str = "Subcategory with this name already exists";

pub struct SubcategoryService {
    repo: Arc<dyn SubcategoryRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl SubcategoryService {
    pub fn new(
        repo: Arc<dyn SubcategoryRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self { repo, categories }
    }

    async fn live_category(&self, category_id: Uuid) -> Result<(), AppError> {
        match self.categories.find_by_id(category_id).await? {
            Some(category) if !category.is_deleted() => Ok(()),
            _ => Err(AppError::not_found(format!(
                "Category with ID \"{category_id}\" not found"
            ))),
        }
    }

    /// The subcategory under a live category, deleted or not.
    async fn scoped(&self, category_id: Uuid, id: Uuid) -> Result<Subcategory, AppError> {
        self.live_category(category_id).await?;
        self.repo
            .find_by_id(id)
            .await?
            .filter(|s| s.category_id == category_id)
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    async fn mutable(
        &self,
        category_id: Uuid,
        id: Uuid,
        message: &str,
    ) -> Result<Subcategory, AppError> {
        let subcategory = self.scoped(category_id, id).await?;
        if subcategory.is_deleted() {
            return Err(AppError::conflict(message));
        }
        Ok(subcategory)
    }

    pub async fn list(&self, category_id: Uuid) -> Result<Vec<Subcategory>, AppError> {
        self.live_category(category_id).await?;
        let subcategories = self.repo.list_for_category(category_id).await?;
        debug!(%category_id, count = subcategories.len(), "subcategories listed");
        Ok(subcategories)
    }

    pub async fn get(&self, category_id: Uuid, id: Uuid) -> Result<Subcategory, AppError> {
        let subcategory = self.scoped(category_id, id).await?;
        if subcategory.is_deleted() {
            return Err(AppError::not_found(NOT_FOUND));
        }
        Ok(subcategory)
    }

    pub async fn create(
        &self,
        category_id: Uuid,
        entry: NewCatalogEntry,
    ) -> Result<Subcategory, AppError> {
        self.live_category(category_id).await?;
        if self.repo.name_exists(category_id, &entry.name, None).await? {
            return Err(AppError::conflict(NAME_TAKEN));
        }
        let subcategory = self.repo.create(category_id, entry).await?;
        info!(%category_id, subcategory_id = %subcategory.id, "subcategory created");
        Ok(subcategory)
    }

    pub async fn update(
        &self,
        category_id: Uuid,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Subcategory, AppError> {
        self.mutable(category_id, id, "Cannot update deleted subcategory")
            .await?;
        if let Some(name) = changes.name.as_deref() {
            if self.repo.name_exists(category_id, name, Some(id)).await? {
                return Err(AppError::conflict(NAME_TAKEN));
            }
        }
        let subcategory = self.repo.update(id, changes).await?;
        info!(subcategory_id = %id, "subcategory updated");
        Ok(subcategory)
    }

    pub async fn delete(&self, category_id: Uuid, id: Uuid) -> Result<Subcategory, AppError> {
        self.mutable(category_id, id, "Subcategory already deleted")
            .await?;
        let subcategory = self.repo.soft_delete(id).await?;
        info!(subcategory_id = %id, "subcategory deleted");
        Ok(subcategory)
    }

    pub async fn deactivate(&self, category_id: Uuid, id: Uuid) -> Result<Subcategory, AppError> {
        self.mutable(category_id, id, "Cannot deactivate deleted subcategory")
            .await?;
        self.set_status(id, CatalogStatus::Inactive).await
    }

    pub async fn activate(&self, category_id: Uuid, id: Uuid) -> Result<Subcategory, AppError> {
        self.mutable(category_id, id, "Cannot activate deleted subcategory")
            .await?;
        self.set_status(id, CatalogStatus::Active).await
    }

    async fn set_status(&self, id: Uuid, status: CatalogStatus) -> Result<Subcategory, AppError> {
        let subcategory = self
            .repo
            .update(
                id,
                CatalogChanges {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;
        info!(subcategory_id = %id, ?status, "subcategory status changed");
        Ok(subcategory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn service() -> (Arc<MemoryStore>, SubcategoryService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SubcategoryService::new(store.clone(), store))
    }

    fn entry(name: &str) -> NewCatalogEntry {
        NewCatalogEntry {
            name: name.into(),
            description: None,
            status: CatalogStatus::Active,
        }
    }

    #[tokio::test]
    async fn names_are_unique_per_category_only() {
        let (store, service) = service();
        let phones = store.add_category("Phones");
        let tablets = store.add_category("Tablets");

        service.create(phones.id, entry("Accessories")).await.unwrap();
        assert!(matches!(
            service.create(phones.id, entry("accessories")).await,
            Err(AppError::Conflict(m)) if m == NAME_TAKEN
        ));
        service.create(tablets.id, entry("Accessories")).await.unwrap();
    }

    #[tokio::test]
    async fn deleted_parent_hides_children() {
        let (store, service) = service();
        let category = store.add_category("Outdoor");
        let tents = store.add_subcategory(category.id, "Tents");

        assert_eq!(service.list(category.id).await.unwrap().len(), 1);
        store.set_category_status(category.id, CatalogStatus::Deleted);

        assert!(matches!(
            service.list(category.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get(category.id, tents.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.create(category.id, entry("Stoves")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn wrong_parent_is_not_found_and_deleted_conflicts() {
        let (store, service) = service();
        let a = store.add_category("Kitchen");
        let b = store.add_category("Bath");
        let knives = store.add_subcategory(a.id, "Knives");

        assert!(matches!(
            service.get(b.id, knives.id).await,
            Err(AppError::NotFound(m)) if m == NOT_FOUND
        ));

        service.delete(a.id, knives.id).await.unwrap();
        assert!(service.list(a.id).await.unwrap().is_empty());
        assert!(matches!(
            service.deactivate(a.id, knives.id).await,
            Err(AppError::Conflict(m)) if m == "Cannot deactivate deleted subcategory"
        ));
        assert!(matches!(
            service
                .update(a.id, knives.id, CatalogChanges::default())
                .await,
            Err(AppError::Conflict(m)) if m == "Cannot update deleted subcategory"
        ));
    }
}
