use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::InventoryRepository;
use crate::api::products::repository::ProductRepository;
use crate::schema::catalog::{ProductWithRelations, StockChange};
use crate::shared::error::AppError;

const DEFAULT_REASON: &str = "manual adjustment";

pub struct InventoryService {
    repo: Arc<dyn InventoryRepository>,
    products: Arc<dyn ProductRepository>,
}

impl InventoryService {
    pub fn new(repo: Arc<dyn InventoryRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { repo, products }
    }

    async fn product(&self, id: Uuid) -> Result<ProductWithRelations, AppError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))
    }

    pub async fn list(&self) -> Result<Vec<ProductWithRelations>, AppError> {
        let products: Vec<_> = self
            .products
            .list_all()
            .await?
            .into_iter()
            .filter(ProductWithRelations::is_visible)
            .collect();
        debug!(count = products.len(), "inventory listed");
        Ok(products)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductWithRelations, AppError> {
        self.products
            .find_by_id(id)
            .await?
            .filter(ProductWithRelations::is_visible)
            .ok_or_else(|| AppError::not_found("Product not found or category/subcategory deleted"))
    }

    /// Overwrites the stock level; unchanged levels leave no log row.
    pub async fn set_quantity(
        &self,
        id: Uuid,
        quantity: i32,
        reason: Option<String>,
    ) -> Result<ProductWithRelations, AppError> {
        let current = self.product(id).await?;
        if !current.is_visible() {
            return Err(AppError::bad_request(
                "Product not available due to category/subcategory status",
            ));
        }
        if quantity < 0 {
            return Err(AppError::bad_request("Quantity cannot be negative"));
        }

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REASON.to_string());
        let (product, change) = self
            .repo
            .set_quantity(id, quantity, &reason)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        match change {
            Some(change) => info!(
                product_id = %id,
                from = change.previous_quantity,
                to = change.quantity,
                %reason,
                "stock adjusted"
            ),
            None => debug!(product_id = %id, quantity, "stock unchanged"),
        }
        Ok(ProductWithRelations {
            product,
            category: current.category,
            subcategory: current.subcategory,
        })
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<StockChange>, AppError> {
        self.product(id).await?;
        Ok(self.repo.history(id).await?)
    }
}
