use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::repository::OrderRepository;
use crate::api::products::repository::ProductRepository;
use crate::schema::commerce::{NewOrder, Order, OrderItem, OrderStatus};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { repo, products }
    }

    async fn existing(&self, id: Uuid) -> Result<Order, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|o| !o.is_deleted())
            .ok_or_else(|| AppError::not_found("Order not found"))
    }

    /// Someone else's order is reported as missing.
    async fn owned(&self, user_id: Uuid, id: Uuid) -> Result<Order, AppError> {
        let order = self.existing(id).await?;
        if order.user_id != user_id {
            return Err(AppError::not_found("Order not found"));
        }
        Ok(order)
    }

    /// Prices every line at the product's current price, then places the
    /// order in one step: stock decrement, insert and cart clear together.
    pub async fn create(
        &self,
        user_id: Uuid,
        lines: Vec<(Uuid, i32)>,
    ) -> Result<Order, AppError> {
        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let product = self
                .products
                .find_by_id(product_id)
                .await?
                .filter(|p| p.is_purchasable())
                .ok_or_else(|| {
                    AppError::not_found(format!("Product {product_id} not found or inactive"))
                })?;
            if product.product.quantity < quantity {
                return Err(AppError::bad_request(format!(
                    "Insufficient stock for product {product_id}"
                )));
            }
            items.push(OrderItem {
                product_id,
                quantity,
                price: product.product.price,
            });
        }

        let order = self
            .repo
            .place(NewOrder::from_items(user_id, items))
            .await
            .inspect_err(|e| warn!(%user_id, error = %e, "order placement failed"))?;
        info!(%user_id, order_id = %order.id, total = %order.total, "order placed");
        Ok(order)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        let orders = self.repo.list_for_user(user_id).await?;
        debug!(%user_id, count = orders.len(), "orders listed");
        Ok(orders)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Order, AppError> {
        self.owned(user_id, id).await
    }

    pub async fn cancel(&self, user_id: Uuid, id: Uuid) -> Result<Order, AppError> {
        let order = self.owned(user_id, id).await?;
        if order.status != OrderStatus::Pending {
            return Err(AppError::bad_request("Only pending orders can be cancelled"));
        }
        let order = self
            .repo
            .transition(id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?;
        info!(%user_id, order_id = %id, "order cancelled");
        Ok(order)
    }

    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, AppError> {
        let order = self.existing(id).await?;
        if order.status.is_terminal() {
            return Err(AppError::bad_request(
                "Cannot update status of cancelled or refunded order",
            ));
        }
        let updated = self.repo.transition(id, order.status, status).await?;
        info!(order_id = %id, from = ?order.status, to = ?status, "order status updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cart::repository::CartRepository;
    use crate::db::memory::MemoryStore;
    use crate::schema::catalog::CatalogStatus;
    use crate::schema::models::RoleName;
    use rust_decimal::Decimal;

    fn service() -> (Arc<MemoryStore>, OrderService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), OrderService::new(store.clone(), store))
    }

    #[tokio::test]
    async fn placing_an_order_prices_decrements_and_clears_cart() {
        let (store, service) = service();
        let buyer = store.add_user("b@shop.test", "hash", &[RoleName::User]);
        let stranger = store.add_user("s@shop.test", "hash", &[RoleName::User]);
        let product = store.add_product("Lamp", Decimal::new(1250, 2), 10);
        CartRepository::create(store.as_ref(), buyer.id, product.id, 1)
            .await
            .unwrap();

        let order = service
            .create(buyer.id, vec![(product.id, 3)])
            .await
            .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].price, Decimal::new(1250, 2));
        assert_eq!(order.total, Decimal::new(3750, 2));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(store.product(product.id).unwrap().quantity, 7);
        assert_eq!(store.cart_size(buyer.id), 0);

        assert!(matches!(
            service.get(stranger.id, order.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.get(buyer.id, order.id).await.unwrap().id, order.id);
    }

    #[tokio::test]
    async fn short_stock_leaves_everything_untouched() {
        let (store, service) = service();
        let buyer = store.add_user("b@shop.test", "hash", &[RoleName::User]);
        let plenty = store.add_product("Cup", Decimal::ONE, 10);
        let scarce = store.add_product("Vase", Decimal::TEN, 1);

        let err = service
            .create(buyer.id, vec![(plenty.id, 2), (scarce.id, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("Insufficient stock")));
        assert_eq!(store.product(plenty.id).unwrap().quantity, 10);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn repeated_lines_are_checked_together() {
        let (store, service) = service();
        let buyer = store.add_user("b@shop.test", "hash", &[RoleName::User]);
        let product = store.add_product("Cup", Decimal::ONE, 3);

        // each line fits on its own, both together do not
        let err = service
            .create(buyer.id, vec![(product.id, 2), (product.id, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.product(product.id).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn inactive_products_cannot_be_ordered() {
        let (store, service) = service();
        let buyer = store.add_user("b@shop.test", "hash", &[RoleName::User]);
        let product = store.add_product("Cup", Decimal::ONE, 3);
        store.set_product_status(product.id, CatalogStatus::Inactive);

        assert!(matches!(
            service.create(buyer.id, vec![(product.id, 1)]).await,
            Err(AppError::NotFound(m)) if m.ends_with("not found or inactive")
        ));
    }

    #[tokio::test]
    async fn only_pending_orders_cancel() {
        let (store, service) = service();
        let buyer = store.add_user("b@shop.test", "hash", &[RoleName::User]);
        let product = store.add_product("Cup", Decimal::ONE, 5);
        let order = service
            .create(buyer.id, vec![(product.id, 1)])
            .await
            .unwrap();

        store.set_order_status(order.id, OrderStatus::Confirmed);
        assert!(matches!(
            service.cancel(buyer.id, order.id).await,
            Err(AppError::BadRequest(m)) if m == "Only pending orders can be cancelled"
        ));

        store.set_order_status(order.id, OrderStatus::Pending);
        let cancelled = service.cancel(buyer.id, order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        // cancelling does not restock
        assert_eq!(store.product(product.id).unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn terminal_orders_refuse_status_updates() {
        let (store, service) = service();
        let buyer = store.add_user("b@shop.test", "hash", &[RoleName::User]);
        let product = store.add_product("Cup", Decimal::ONE, 5);
        let order = service
            .create(buyer.id, vec![(product.id, 1)])
            .await
            .unwrap();

        let shipped = service
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        store.set_order_status(order.id, OrderStatus::Refunded);
        assert!(matches!(
            service.update_status(order.id, OrderStatus::Delivered).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.update_status(Uuid::new_v4(), OrderStatus::Shipped).await,
            Err(AppError::NotFound(_))
        ));
    }
}
