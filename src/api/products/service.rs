use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::ProductRepository;
use crate::api::categories::repository::CategoryRepository;
use crate::api::subcategories::repository::SubcategoryRepository;
use crate::schema::catalog::{
    CatalogStatus, Category, NewProduct, Product, ProductChanges, ProductWithRelations,
    Subcategory,
};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

const NOT_FOUND: &str = "Product not found";
const NAME_TAKEN: &str = "Product with this name already exists in the subcategory";

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    subcategories: Arc<dyn SubcategoryRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl ProductService {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        subcategories: Arc<dyn SubcategoryRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            repo,
            subcategories,
            categories,
        }
    }

    /// Both live ancestors, or a message naming the first broken link.
    async fn parents(
        &self,
        subcategory_id: Uuid,
    ) -> Result<Result<(Category, Subcategory), &'static str>, AppError> {
        let Some(subcategory) = self
            .subcategories
            .find_by_id(subcategory_id)
            .await?
            .filter(|s| !s.is_deleted())
        else {
            return Ok(Err("Subcategory not found or deleted"));
        };
        let Some(category) = self
            .categories
            .find_by_id(subcategory.category_id)
            .await?
            .filter(|c| !c.is_deleted())
        else {
            return Ok(Err("Category not found or deleted"));
        };
        Ok(Ok((category, subcategory)))
    }

    /// Visible product in `subcategory_id`, else NotFound.
    async fn visible(
        &self,
        subcategory_id: Uuid,
        id: Uuid,
    ) -> Result<ProductWithRelations, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|p| p.product.subcategory_id == subcategory_id && p.is_visible())
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    fn with_relations(product: Product, current: ProductWithRelations) -> ProductWithRelations {
        ProductWithRelations {
            product,
            category: current.category,
            subcategory: current.subcategory,
        }
    }

    pub async fn list(&self, subcategory_id: Uuid) -> Result<Vec<ProductWithRelations>, AppError> {
        self.parents(subcategory_id)
            .await?
            .map_err(AppError::not_found)?;
        let products: Vec<_> = self
            .repo
            .list_for_subcategory(subcategory_id)
            .await?
            .into_iter()
            .filter(ProductWithRelations::is_visible)
            .collect();
        debug!(%subcategory_id, count = products.len(), "products listed");
        Ok(products)
    }

    pub async fn get(
        &self,
        subcategory_id: Uuid,
        id: Uuid,
    ) -> Result<ProductWithRelations, AppError> {
        self.visible(subcategory_id, id).await
    }

    pub async fn create(
        &self,
        subcategory_id: Uuid,
        new: NewProduct,
    ) -> Result<ProductWithRelations, AppError> {
        let (category, subcategory) = self
            .parents(subcategory_id)
            .await?
            .map_err(AppError::bad_request)?;
        if self.repo.name_exists(subcategory_id, &new.name, None).await? {
            return Err(AppError::conflict(NAME_TAKEN));
        }

        let product = self.repo.create(category.id, subcategory_id, new).await?;
        info!(product_id = %product.id, %subcategory_id, "product created");
        Ok(ProductWithRelations {
            product,
            category,
            subcategory,
        })
    }

    pub async fn update(
        &self,
        subcategory_id: Uuid,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<ProductWithRelations, AppError> {
        let current = self.visible(subcategory_id, id).await?;
        if let Some(name) = changes.name.as_deref() {
            if name != current.product.name
                && self.repo.name_exists(subcategory_id, name, Some(id)).await?
            {
                return Err(AppError::conflict(NAME_TAKEN));
            }
        }
        let product = self.repo.update(id, changes).await?;
        info!(product_id = %id, "product updated");
        Ok(Self::with_relations(product, current))
    }

    pub async fn delete(&self, subcategory_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.visible(subcategory_id, id).await?;
        self.repo.soft_delete(id).await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn deactivate(
        &self,
        subcategory_id: Uuid,
        id: Uuid,
    ) -> Result<ProductWithRelations, AppError> {
        self.set_status(subcategory_id, id, CatalogStatus::Inactive)
            .await
    }

    pub async fn activate(
        &self,
        subcategory_id: Uuid,
        id: Uuid,
    ) -> Result<ProductWithRelations, AppError> {
        self.set_status(subcategory_id, id, CatalogStatus::Active)
            .await
    }

    async fn set_status(
        &self,
        subcategory_id: Uuid,
        id: Uuid,
        status: CatalogStatus,
    ) -> Result<ProductWithRelations, AppError> {
        let current = self.visible(subcategory_id, id).await?;
        let product = self
            .repo
            .update(
                id,
                ProductChanges {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;
        info!(product_id = %id, ?status, "product status changed");
        Ok(Self::with_relations(product, current))
    }
}
