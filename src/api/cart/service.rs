use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::CartRepository;
use crate::api::products::repository::ProductRepository;
use crate::api::users::repository::UserRepository;
use crate::schema::catalog::ProductWithRelations;
use crate::schema::commerce::{CartItem, CartItemWithProduct};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

const UNAVAILABLE: &str = "Product not found or unavailable";
const OVER_STOCK: &str = "Requested quantity exceeds available stock";

pub struct CartService {
    repo: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
}

impl CartService {
    pub fn new(
        repo: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            repo,
            products,
            users,
        }
    }

    async fn require_active(&self, user_id: Uuid) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if !user.is_active() {
            return Err(AppError::forbidden("User account is not active"));
        }
        Ok(())
    }

    async fn visible_product(&self, id: Uuid) -> Result<ProductWithRelations, AppError> {
        self.products
            .find_by_id(id)
            .await?
            .filter(ProductWithRelations::is_visible)
            .ok_or_else(|| AppError::not_found(UNAVAILABLE))
    }

    /// The caller's own cart row; anyone else's is reported as missing.
    async fn owned(&self, user_id: Uuid, id: Uuid) -> Result<CartItem, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|item| item.user_id == user_id)
            .ok_or_else(|| AppError::not_found("Cart item not found"))
    }

    /// Rows whose product is still visible, with the product attached.
    async fn hydrate(&self, user_id: Uuid) -> Result<Vec<CartItemWithProduct>, AppError> {
        let mut items = Vec::new();
        for item in self.repo.list_for_user(user_id).await? {
            if let Some(product) = self
                .products
                .find_by_id(item.product_id)
                .await?
                .filter(ProductWithRelations::is_visible)
            {
                items.push(CartItemWithProduct { item, product });
            }
        }
        Ok(items)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<CartItemWithProduct>, AppError> {
        self.require_active(user_id).await?;
        let items = self.hydrate(user_id).await?;
        debug!(%user_id, count = items.len(), "cart listed");
        Ok(items)
    }

    pub async fn list_for_admin(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CartItemWithProduct>, AppError> {
        let user = self.users.find_by_id(user_id).await?;
        if user.as_ref().is_none_or(|u| u.is_deleted()) {
            return Err(AppError::not_found("User not found"));
        }
        self.hydrate(user_id).await
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItemWithProduct, AppError> {
        self.require_active(user_id).await?;
        let product = self.visible_product(product_id).await?;
        if quantity > product.product.quantity {
            return Err(AppError::bad_request(OVER_STOCK));
        }
        if self
            .repo
            .find_by_user_and_product(user_id, product_id)
            .await?
            .is_some()
        {
            return Err(AppError::bad_request("Product already exists in cart"));
        }

        let item = self.repo.create(user_id, product_id, quantity).await?;
        info!(%user_id, %product_id, quantity, "added to cart");
        Ok(CartItemWithProduct { item, product })
    }

    /// A quantity of zero removes the row and still reports BadRequest.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        quantity: i32,
    ) -> Result<CartItemWithProduct, AppError> {
        self.require_active(user_id).await?;
        let item = self.owned(user_id, id).await?;
        let product = self.visible_product(item.product_id).await?;
        if quantity > product.product.quantity {
            return Err(AppError::bad_request(OVER_STOCK));
        }
        if quantity == 0 {
            self.repo.delete(id).await?;
            info!(%user_id, cart_item_id = %id, "cart item removed by zero quantity");
            return Err(AppError::bad_request(
                "Quantity set to 0, item removed from cart",
            ));
        }

        let item = self.repo.update_quantity(id, quantity).await?;
        debug!(%user_id, cart_item_id = %id, quantity, "cart item updated");
        Ok(CartItemWithProduct { item, product })
    }

    pub async fn remove(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.require_active(user_id).await?;
        self.owned(user_id, id).await?;
        self.repo.delete(id).await?;
        info!(%user_id, cart_item_id = %id, "cart item removed");
        Ok(())
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<(), AppError> {
        self.require_active(user_id).await?;
        let removed = self.repo.clear(user_id).await?;
        info!(%user_id, removed, "cart cleared");
        Ok(())
    }
}
