//! HTTP surface: one module per resource, each split into controller,
//! service, repository and DTOs. [`routes`] wires them all together.

use std::sync::Arc;

use sqlx::PgPool;
use warp::filters::BoxedFilter;
use warp::{Filter, Reply};

use crate::shared::error::handlers::handle_rejection;
use crate::shared::mail::Mailer;
use crate::shared::storage::StorageProvider;
use crate::shared::utils::hash::Hasher;
use crate::shared::utils::jwt::JwtKeys;

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod inventory;
pub mod media;
pub mod orders;
pub mod payments;
pub mod products;
pub mod subcategories;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

use addresses::repository::{AddressRepository, PgAddressRepository};
use auth::repository::{AuthRepository, PgAuthRepository};
use cart::repository::{CartRepository, PgCartRepository};
use categories::repository::{CategoryRepository, PgCategoryRepository};
use inventory::repository::{InventoryRepository, PgInventoryRepository};
use media::repository::{MediaRepository, PgMediaRepository};
use orders::repository::{OrderRepository, PgOrderRepository};
use payments::repository::{PaymentRepository, PgPaymentRepository};
use products::repository::{PgProductRepository, ProductRepository};
use subcategories::repository::{PgSubcategoryRepository, SubcategoryRepository};
use users::repository::{PgUserRepository, UserRepository};

pub struct Repositories {
    pub auth: Arc<dyn AuthRepository>,
    pub users: Arc<dyn UserRepository>,
    pub addresses: Arc<dyn AddressRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub subcategories: Arc<dyn SubcategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub cart: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub media: Arc<dyn MediaRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            auth: Arc::new(PgAuthRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            addresses: Arc::new(PgAddressRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            subcategories: Arc::new(PgSubcategoryRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            inventory: Arc::new(PgInventoryRepository::new(pool.clone())),
            cart: Arc::new(PgCartRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            media: Arc::new(PgMediaRepository::new(pool)),
        }
    }
}

/// Process-wide collaborators the services share.
pub struct Collaborators {
    pub keys: Arc<JwtKeys>,
    pub hasher: Hasher,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn StorageProvider>,
    pub frontend_url: String,
}

/// Every resource's routes behind a single rejection handler.
pub fn routes(repos: Repositories, deps: Collaborators) -> BoxedFilter<(impl Reply,)> {
    let keys = deps.keys;

    let auth = auth::controller::auth_routes(
        Arc::new(auth::service::AuthService::new(
            repos.auth,
            deps.hasher,
            keys.clone(),
            deps.mailer,
            deps.frontend_url,
        )),
        keys.clone(),
    );
    let users = users::controller::user_routes(
        Arc::new(users::service::UserService::new(repos.users.clone())),
        keys.clone(),
    );
    let addresses = addresses::controller::address_routes(
        Arc::new(addresses::service::AddressService::new(repos.addresses)),
        keys.clone(),
    );
    let categories = categories::controller::category_routes(
        Arc::new(categories::service::CategoryService::new(
            repos.categories.clone(),
        )),
        keys.clone(),
    );
    let subcategories = subcategories::controller::subcategory_routes(
        Arc::new(subcategories::service::SubcategoryService::new(
            repos.subcategories.clone(),
            repos.categories.clone(),
        )),
        keys.clone(),
    );
    let products = products::controller::product_routes(
        Arc::new(products::service::ProductService::new(
            repos.products.clone(),
            repos.subcategories,
            repos.categories,
        )),
        keys.clone(),
    );
    let inventory = inventory::controller::inventory_routes(
        Arc::new(inventory::service::InventoryService::new(
            repos.inventory,
            repos.products.clone(),
        )),
        keys.clone(),
    );
    let cart = cart::controller::cart_routes(
        Arc::new(cart::service::CartService::new(
            repos.cart,
            repos.products.clone(),
            repos.users.clone(),
        )),
        keys.clone(),
    );
    let orders = orders::controller::order_routes(
        Arc::new(orders::service::OrderService::new(
            repos.orders.clone(),
            repos.products.clone(),
        )),
        keys.clone(),
    );
    let payments = payments::controller::payment_routes(
        Arc::new(payments::service::PaymentService::new(
            repos.payments,
            repos.orders,
        )),
        keys.clone(),
    );
    let media = media::controller::media_routes(
        Arc::new(media::service::MediaService::new(
            repos.media,
            deps.storage,
            repos.products,
            repos.users,
        )),
        keys,
    );

    auth.or(users)
        .or(addresses)
        .or(categories)
        .or(subcategories)
        .or(products)
        .or(inventory)
        .or(cart)
        .or(orders)
        .or(payments)
        .or(media)
        .recover(handle_rejection)
        .boxed()
}
