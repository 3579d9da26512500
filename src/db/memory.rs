//! In-memory implementation of every repository trait, used by service and
//! route tests. One mutex guards all tables, so each call is atomic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::addresses::repository::AddressRepository;
use crate::api::auth::repository::AuthRepository;
use crate::api::cart::repository::CartRepository;
use crate::api::categories::repository::CategoryRepository;
use crate::api::inventory::repository::InventoryRepository;
use crate::api::media::repository::MediaRepository;
use crate::api::orders::repository::OrderRepository;
use crate::api::payments::repository::PaymentRepository;
use crate::api::products::repository::ProductRepository;
use crate::api::subcategories::repository::SubcategoryRepository;
use crate::api::users::repository::UserRepository;
use crate::schema::catalog::{
    CatalogChanges, CatalogStatus, Category, CategoryWithSubcategories, NewCatalogEntry,
    NewProduct, Product, ProductChanges, ProductWithRelations, StockChange, Subcategory,
};
use crate::schema::commerce::{
    CartItem, NewOrder, NewPayment, Order, OrderStatus, Payment, PaymentStatus,
};
use crate::schema::media::{Media, MediaChanges, NewMedia};
use crate::schema::models::{
    Address, AddressChanges, LoginInfo, NewAddress, NewUser, PendingRegistration, ProfileChanges,
    RoleName, User, UserStatus,
};
use crate::schema::status::SoftDeletable;
use crate::shared::error::RepositoryError;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    user_roles: HashMap<Uuid, Vec<RoleName>>,
    addresses: Vec<Address>,
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    products: Vec<Product>,
    stock_changes: Vec<StockChange>,
    cart: Vec<CartItem>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
    media: Vec<Media>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> Result<&mut User, RepositoryError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::Database(sqlx::Error::RowNotFound))
    }

    fn product_with_relations(&self, id: Uuid) -> Option<ProductWithRelations> {
        let product = self.products.iter().find(|p| p.id == id)?.clone();
        let category = self
            .categories
            .iter()
            .find(|c| c.id == product.category_id)?
            .clone();
        let subcategory = self
            .subcategories
            .iter()
            .find(|s| s.id == product.subcategory_id)?
            .clone();
        Some(ProductWithRelations {
            product,
            category,
            subcategory,
        })
    }
}

fn not_found() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::RowNotFound)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn db(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    // ---- fixtures ----

    /// A verified, active user holding `roles`.
    pub fn add_user(&self, email: &str, password_hash: &str, roles: &[RoleName]) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: email.split('@').next().unwrap_or(email).to_string(),
            password_hash: password_hash.to_string(),
            first_name: None,
            last_name: None,
            dob: None,
            phone: None,
            is_email_verified: true,
            otp_hash: None,
            otp_expiry: None,
            current_hashed_refresh_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            previous_passwords: vec![password_hash.to_string()],
            failed_login_attempts: 0,
            status: UserStatus::Active,
            last_login: None,
            last_password_change: None,
            login_ip: None,
            login_user_agent: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let mut db = self.db();
        db.user_roles.insert(user.id, roles.to_vec());
        db.users.push(user.clone());
        user
    }

    pub fn add_category(&self, name: &str) -> Category {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            status: CatalogStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.db().categories.push(category.clone());
        category
    }

    pub fn add_subcategory(&self, category_id: Uuid, name: &str) -> Subcategory {
        let now = Utc::now();
        let subcategory = Subcategory {
            id: Uuid::new_v4(),
            category_id,
            name: name.to_string(),
            description: None,
            status: CatalogStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.db().subcategories.push(subcategory.clone());
        subcategory
    }

    /// Product plus a fresh category and subcategory above it.
    pub fn add_product(&self, name: &str, price: Decimal, quantity: i32) -> Product {
        let category = self.add_category(&format!("{name} category"));
        let subcategory = self.add_subcategory(category.id, &format!("{name} subcategory"));
        self.add_product_under(&subcategory, name, price, quantity)
    }

    pub fn add_product_under(
        &self,
        subcategory: &Subcategory,
        name: &str,
        price: Decimal,
        quantity: i32,
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            category_id: subcategory.category_id,
            subcategory_id: subcategory.id,
            name: name.to_string(),
            description: None,
            price,
            quantity,
            status: CatalogStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.db().products.push(product.clone());
        product
    }

    // ---- inspection and tampering ----

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.db().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.db().users.iter().find(|u| u.email == email).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.db().users.len()
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.db().products.iter().find(|p| p.id == id).cloned()
    }

    pub fn cart_size(&self, user_id: Uuid) -> usize {
        self.db().cart.iter().filter(|c| c.user_id == user_id).count()
    }

    pub fn order_count(&self) -> usize {
        self.db().orders.len()
    }

    pub fn set_product_status(&self, id: Uuid, status: CatalogStatus) {
        if let Some(p) = self.db().products.iter_mut().find(|p| p.id == id) {
            p.status = status;
        }
    }

    pub fn set_category_status(&self, id: Uuid, status: CatalogStatus) {
        if let Some(c) = self.db().categories.iter_mut().find(|c| c.id == id) {
            c.status = status;
        }
    }

    pub fn set_user_status(&self, id: Uuid, status: UserStatus) {
        if let Some(u) = self.db().users.iter_mut().find(|u| u.id == id) {
            u.status = status;
        }
    }

    pub fn set_order_status(&self, id: Uuid, status: OrderStatus) {
        if let Some(o) = self.db().orders.iter_mut().find(|o| o.id == id) {
            o.status = status;
        }
    }

    /// Moves the user's OTP expiry into the past.
    pub fn expire_otp(&self, email: &str) {
        if let Some(u) = self.db().users.iter_mut().find(|u| u.email == email) {
            u.otp_expiry = Some(Utc::now() - Duration::seconds(1));
        }
    }

    pub fn expire_reset_token(&self, email: &str) {
        if let Some(u) = self.db().users.iter_mut().find(|u| u.email == email) {
            u.password_reset_expires = Some(Utc::now() - Duration::seconds(1));
        }
    }
}

// --------------------------------
// USERS / AUTH
// --------------------------------
#[async_trait]
impl AuthRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.user_by_email(email))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.user(id))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        Ok(self.db().users.iter().any(|u| u.username == username))
    }

    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<RoleName>, RepositoryError> {
        Ok(self.db().user_roles.get(&user_id).cloned().unwrap_or_default())
    }

    async fn create_pending(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut db = self.db();
        if db.users.iter().any(|u| u.email == new.email) {
            return Err(RepositoryError::Conflict("Email already registered".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            username: new.username,
            password_hash: new.password_hash.clone(),
            first_name: None,
            last_name: None,
            dob: None,
            phone: None,
            is_email_verified: false,
            otp_hash: Some(new.otp_hash),
            otp_expiry: Some(new.otp_expiry),
            current_hashed_refresh_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            previous_passwords: vec![new.password_hash],
            failed_login_attempts: 0,
            status: UserStatus::Active,
            last_login: None,
            last_password_change: None,
            login_ip: None,
            login_user_agent: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        db.users.push(user.clone());
        Ok(user)
    }

    async fn restart_registration(
        &self,
        id: Uuid,
        pending: PendingRegistration,
    ) -> Result<(), RepositoryError> {
        let mut db = self.db();
        let user = db.user_mut(id)?;
        if !user.is_email_verified {
            user.password_hash = pending.password_hash.clone();
            user.previous_passwords = vec![pending.password_hash];
            user.otp_hash = Some(pending.otp_hash);
            user.otp_expiry = Some(pending.otp_expiry);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut db = self.db();
        let user = db.user_mut(id)?;
        user.is_email_verified = true;
        user.otp_hash = None;
        user.otp_expiry = None;
        user.status = UserStatus::Active;
        let roles = db.user_roles.entry(id).or_default();
        if !roles.contains(&RoleName::User) {
            roles.push(RoleName::User);
        }
        Ok(())
    }

    async fn record_failed_login(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.db().user_mut(id)?.failed_login_attempts += 1;
        Ok(())
    }

    async fn record_login(
        &self,
        id: Uuid,
        refresh_hash: &str,
        info: LoginInfo,
    ) -> Result<(), RepositoryError> {
        let mut db = self.db();
        let user = db.user_mut(id)?;
        user.current_hashed_refresh_token = Some(refresh_hash.to_string());
        user.failed_login_attempts = 0;
        user.last_login = Some(Utc::now());
        user.login_ip = info.ip;
        user.login_user_agent = info.user_agent;
        Ok(())
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        hash: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.db().user_mut(id)?.current_hashed_refresh_token = hash.map(str::to_string);
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        hash: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut db = self.db();
        let user = db.user_mut(id)?;
        user.password_reset_token = Some(hash.to_string());
        user.password_reset_expires = Some(expires);
        Ok(())
    }

    async fn users_with_live_reset_token(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .db()
            .users
            .iter()
            .filter(|u| {
                u.password_reset_token.is_some()
                    && u.password_reset_expires.is_some_and(|exp| exp > now)
            })
            .cloned()
            .collect())
    }

    async fn reset_password(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> Result<(), RepositoryError> {
        let mut db = self.db();
        let user = db.user_mut(id)?;
        user.password_hash = password_hash.to_string();
        user.previous_passwords = history.to_vec();
        user.password_reset_token = None;
        user.password_reset_expires = None;
        user.last_password_change = Some(Utc::now());
        user.failed_login_attempts = 0;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.user(id))
    }

    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<RoleName>, RepositoryError> {
        Ok(self.db().user_roles.get(&user_id).cloned().unwrap_or_default())
    }

    async fn list_active(&self) -> Result<Vec<(User, Vec<RoleName>)>, RepositoryError> {
        let db = self.db();
        Ok(db
            .users
            .iter()
            .filter(|u| !u.is_deleted())
            .map(|u| {
                let roles = db.user_roles.get(&u.id).cloned().unwrap_or_default();
                (u.clone(), roles)
            })
            .collect())
    }

    async fn username_taken(&self, username: &str, except: Uuid) -> Result<bool, RepositoryError> {
        Ok(self
            .db()
            .users
            .iter()
            .any(|u| u.username == username && u.id != except))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        c: ProfileChanges,
    ) -> Result<User, RepositoryError> {
        let mut db = self.db();
        if let Some(name) = &c.username {
            if db.users.iter().any(|u| &u.username == name && u.id != id) {
                return Err(RepositoryError::Conflict("Username already taken".into()));
            }
        }
        let user = db.user_mut(id)?;
        if let Some(v) = c.first_name {
            user.first_name = Some(v);
        }
        if let Some(v) = c.last_name {
            user.last_name = Some(v);
        }
        if let Some(v) = c.username {
            user.username = v;
        }
        if let Some(v) = c.dob {
            user.dob = Some(v);
        }
        if let Some(v) = c.phone {
            user.phone = Some(v);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut db = self.db();
        let user = db.user_mut(id)?;
        user.status = UserStatus::Deleted;
        user.deleted_at = Some(Utc::now());
        user.current_hashed_refresh_token = None;
        Ok(())
    }

    async fn set_roles(&self, id: Uuid, roles: &[RoleName]) -> Result<(), RepositoryError> {
        self.db().user_roles.insert(id, roles.to_vec());
        Ok(())
    }
}

// --------------------------------
// ADDRESSES
// --------------------------------
#[async_trait]
impl AddressRepository for MemoryStore {
    async fn create(&self, user_id: Uuid, a: NewAddress) -> Result<Address, RepositoryError> {
        let mut db = self.db();
        if a.is_default {
            for other in db.addresses.iter_mut().filter(|x| x.user_id == user_id) {
                other.is_default = false;
            }
        }
        let now = Utc::now();
        let address = Address {
            id: Uuid::new_v4(),
            user_id,
            first_name: a.first_name,
            last_name: a.last_name,
            phone: a.phone,
            street: a.street,
            address_line2: a.address_line2,
            city: a.city,
            state: a.state,
            country: a.country,
            zip_code: a.zip_code,
            latitude: a.latitude,
            longitude: a.longitude,
            address_type: a.address_type,
            is_default: a.is_default,
            delivery_instructions: a.delivery_instructions,
            label: a.label,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        db.addresses.push(address.clone());
        Ok(address)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Address>, RepositoryError> {
        Ok(self
            .db()
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id && !a.is_deleted())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Address>, RepositoryError> {
        Ok(self.db().addresses.iter().find(|a| a.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        c: AddressChanges,
    ) -> Result<Address, RepositoryError> {
        let mut db = self.db();
        if c.is_default == Some(true) {
            for other in db.addresses.iter_mut().filter(|x| x.user_id == user_id) {
                other.is_default = false;
            }
        }
        let a = db
            .addresses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(not_found)?;
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = c.$field {
                    a.$field = v;
                }
            };
            (opt $field:ident) => {
                if let Some(v) = c.$field {
                    a.$field = Some(v);
                }
            };
        }
        set!(first_name);
        set!(last_name);
        set!(opt phone);
        set!(street);
        set!(opt address_line2);
        set!(city);
        set!(state);
        set!(country);
        set!(zip_code);
        set!(opt latitude);
        set!(opt longitude);
        set!(address_type);
        set!(is_default);
        set!(opt delivery_instructions);
        set!(opt label);
        a.updated_at = Utc::now();
        Ok(a.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut db = self.db();
        let a = db
            .addresses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(not_found)?;
        a.deleted_at = Some(Utc::now());
        a.is_default = false;
        Ok(())
    }
}

// --------------------------------
// CATALOG
// --------------------------------
fn apply_catalog_changes(
    name: &mut String,
    description: &mut Option<String>,
    status: &mut CatalogStatus,
    c: CatalogChanges,
) {
    if let Some(v) = c.name {
        *name = v;
    }
    if let Some(v) = c.description {
        *description = Some(v);
    }
    if let Some(v) = c.status {
        *status = v;
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<CategoryWithSubcategories>, RepositoryError> {
        let db = self.db();
        Ok(db
            .categories
            .iter()
            .filter(|c| !c.is_deleted())
            .map(|c| CategoryWithSubcategories {
                category: c.clone(),
                subcategories: db
                    .subcategories
                    .iter()
                    .filter(|s| s.category_id == c.id && !s.is_deleted())
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        Ok(self.db().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn name_exists(&self, name: &str, except: Option<Uuid>) -> Result<bool, RepositoryError> {
        Ok(self.db().categories.iter().any(|c| {
            c.name.eq_ignore_ascii_case(name) && !c.is_deleted() && Some(c.id) != except
        }))
    }

    async fn create(&self, entry: NewCatalogEntry) -> Result<Category, RepositoryError> {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: entry.name,
            description: entry.description,
            status: entry.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.db().categories.push(category.clone());
        Ok(category)
    }

    async fn update(&self, id: Uuid, changes: CatalogChanges) -> Result<Category, RepositoryError> {
        let mut db = self.db();
        let c = db
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(not_found)?;
        apply_catalog_changes(&mut c.name, &mut c.description, &mut c.status, changes);
        c.updated_at = Utc::now();
        Ok(c.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Category, RepositoryError> {
        let mut db = self.db();
        let c = db
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(not_found)?;
        c.status = CatalogStatus::Deleted;
        c.deleted_at = Some(Utc::now());
        Ok(c.clone())
    }
}

#[async_trait]
impl SubcategoryRepository for MemoryStore {
    async fn list_for_category(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<Subcategory>, RepositoryError> {
        Ok(self
            .db()
            .subcategories
            .iter()
            .filter(|s| s.category_id == category_id && !s.is_deleted())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, RepositoryError> {
        Ok(self.db().subcategories.iter().find(|s| s.id == id).cloned())
    }

    async fn name_exists(
        &self,
        category_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.db().subcategories.iter().any(|s| {
            s.category_id == category_id
                && s.name.eq_ignore_ascii_case(name)
                && !s.is_deleted()
                && Some(s.id) != except
        }))
    }

    async fn create(
        &self,
        category_id: Uuid,
        entry: NewCatalogEntry,
    ) -> Result<Subcategory, RepositoryError> {
        let now = Utc::now();
        let subcategory = Subcategory {
            id: Uuid::new_v4(),
            category_id,
            name: entry.name,
            description: entry.description,
            status: entry.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.db().subcategories.push(subcategory.clone());
        Ok(subcategory)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: CatalogChanges,
    ) -> Result<Subcategory, RepositoryError> {
        let mut db = self.db();
        let s = db
            .subcategories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(not_found)?;
        apply_catalog_changes(&mut s.name, &mut s.description, &mut s.status, changes);
        s.updated_at = Utc::now();
        Ok(s.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Subcategory, RepositoryError> {
        let mut db = self.db();
        let s = db
            .subcategories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(not_found)?;
        s.status = CatalogStatus::Deleted;
        s.deleted_at = Some(Utc::now());
        Ok(s.clone())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list_for_subcategory(
        &self,
        subcategory_id: Uuid,
    ) -> Result<Vec<ProductWithRelations>, RepositoryError> {
        let db = self.db();
        Ok(db
            .products
            .iter()
            .filter(|p| p.subcategory_id == subcategory_id && !p.is_deleted())
            .filter_map(|p| db.product_with_relations(p.id))
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ProductWithRelations>, RepositoryError> {
        let db = self.db();
        Ok(db
            .products
            .iter()
            .filter_map(|p| db.product_with_relations(p.id))
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductWithRelations>, RepositoryError> {
        Ok(self.db().product_with_relations(id))
    }

    async fn name_exists(
        &self,
        subcategory_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.db().products.iter().any(|p| {
            p.subcategory_id == subcategory_id
                && p.name.eq_ignore_ascii_case(name)
                && !p.is_deleted()
                && Some(p.id) != except
        }))
    }

    async fn create(
        &self,
        category_id: Uuid,
        subcategory_id: Uuid,
        new: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            category_id,
            subcategory_id,
            name: new.name,
            description: new.description,
            price: new.price,
            quantity: new.quantity,
            status: new.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.db().products.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: Uuid, c: ProductChanges) -> Result<Product, RepositoryError> {
        let mut db = self.db();
        let p = db
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        if let Some(v) = c.name {
            p.name = v;
        }
        if let Some(v) = c.description {
            p.description = Some(v);
        }
        if let Some(v) = c.price {
            p.price = v;
        }
        if let Some(v) = c.quantity {
            p.quantity = v;
        }
        if let Some(v) = c.status {
            p.status = v;
        }
        p.updated_at = Utc::now();
        Ok(p.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Product, RepositoryError> {
        let mut db = self.db();
        let p = db
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        p.status = CatalogStatus::Deleted;
        p.deleted_at = Some(Utc::now());
        Ok(p.clone())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn set_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
        reason: &str,
    ) -> Result<Option<(Product, Option<StockChange>)>, RepositoryError> {
        let mut db = self.db();
        let Some(product) = db.products.iter_mut().find(|p| p.id == product_id) else {
            return Ok(None);
        };
        let previous = product.quantity;
        product.quantity = quantity;
        product.updated_at = Utc::now();
        let product = product.clone();

        let change = (previous != quantity).then(|| StockChange {
            id: Uuid::new_v4(),
            product_id,
            previous_quantity: previous,
            quantity,
            reason: reason.to_string(),
            created_at: Utc::now(),
        });
        if let Some(change) = &change {
            db.stock_changes.push(change.clone());
        }
        Ok(Some((product, change)))
    }

    async fn history(&self, product_id: Uuid) -> Result<Vec<StockChange>, RepositoryError> {
        let mut rows: Vec<_> = self
            .db()
            .stock_changes
            .iter()
            .filter(|c| c.product_id == product_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }
}

// --------------------------------
// CART / ORDERS / PAYMENTS
// --------------------------------
#[async_trait]
impl CartRepository for MemoryStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self
            .db()
            .cart
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self.db().cart.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_user_and_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self
            .db()
            .cart
            .iter()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
            .cloned())
    }

    async fn create(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let mut db = self.db();
        if db
            .cart
            .iter()
            .any(|c| c.user_id == user_id && c.product_id == product_id)
        {
            return Err(RepositoryError::Conflict("Product already in cart".into()));
        }
        let now = Utc::now();
        let item = CartItem {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        db.cart.push(item.clone());
        Ok(item)
    }

    async fn update_quantity(&self, id: Uuid, quantity: i32) -> Result<CartItem, RepositoryError> {
        let mut db = self.db();
        let item = db
            .cart
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(not_found)?;
        item.quantity = quantity;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.db().cart.retain(|c| c.id != id);
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let mut db = self.db();
        let before = db.cart.len();
        db.cart.retain(|c| c.user_id != user_id);
        Ok((before - db.cart.len()) as u64)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut db = self.db();

        // check everything before touching anything
        let mut remaining: HashMap<Uuid, i32> = HashMap::new();
        for item in &order.items {
            let product = db
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .filter(|p| p.status == CatalogStatus::Active && p.deleted_at.is_none())
                .ok_or(RepositoryError::InsufficientStock(item.product_id))?;
            let left = remaining.entry(product.id).or_insert(product.quantity);
            if *left < item.quantity {
                return Err(RepositoryError::InsufficientStock(item.product_id));
            }
            *left -= item.quantity;
        }

        for product in db.products.iter_mut() {
            if let Some(left) = remaining.get(&product.id) {
                product.quantity = *left;
            }
        }

        let now = Utc::now();
        let placed = Order {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            items: order.items,
            total: order.total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        db.orders.push(placed.clone());
        db.cart.retain(|c| c.user_id != order.user_id);
        Ok(placed)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .db()
            .orders
            .iter()
            .filter(|o| o.user_id == user_id && !o.is_deleted())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        Ok(self.db().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut db = self.db();
        let order = db
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status == expected)
            .ok_or_else(|| RepositoryError::Stale("Order status changed, retry".into()))?;
        order.status = next;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.db().payments.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_order(&self, order_id: Uuid) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .db()
            .payments
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>, RepositoryError> {
        let db = self.db();
        Ok(db
            .payments
            .iter()
            .filter(|p| {
                db.orders
                    .iter()
                    .any(|o| o.id == p.order_id && o.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewPayment) -> Result<Payment, RepositoryError> {
        let mut db = self.db();
        if db.payments.iter().any(|p| p.order_id == new.order_id) {
            return Err(RepositoryError::Conflict(
                "Payment already exists for this order".into(),
            ));
        }
        if let Some(next) = new.order_status {
            let order = db
                .orders
                .iter_mut()
                .find(|o| o.id == new.order_id && o.status == OrderStatus::Pending)
                .ok_or_else(|| RepositoryError::Stale("Order is no longer pending".into()))?;
            order.status = next;
            order.updated_at = Utc::now();
        }
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            order_id: new.order_id,
            amount: new.amount,
            method: new.method,
            status: new.status,
            transaction_id: new.transaction_id,
            created_at: now,
            updated_at: now,
        };
        db.payments.push(payment.clone());
        Ok(payment)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment, RepositoryError> {
        let mut db = self.db();
        let payment = db
            .payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        payment.status = status;
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }
}

// --------------------------------
// MEDIA
// --------------------------------
#[async_trait]
impl MediaRepository for MemoryStore {
    async fn create(&self, new: NewMedia) -> Result<Media, RepositoryError> {
        let now = Utc::now();
        let media = Media {
            id: Uuid::new_v4(),
            url: new.url,
            media_type: new.media_type,
            owner: new.owner,
            uploaded_by: new.uploaded_by,
            created_at: now,
            updated_at: now,
        };
        self.db().media.push(media.clone());
        Ok(media)
    }

    async fn list(&self) -> Result<Vec<Media>, RepositoryError> {
        Ok(self.db().media.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Media>, RepositoryError> {
        Ok(self.db().media.iter().find(|m| m.id == id).cloned())
    }

    async fn update(&self, id: Uuid, changes: MediaChanges) -> Result<Media, RepositoryError> {
        let mut db = self.db();
        let media = db
            .media
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(not_found)?;
        if let Some(t) = changes.media_type {
            media.media_type = t;
        }
        if let Some(owner) = changes.owner {
            media.owner = owner;
        }
        media.updated_at = Utc::now();
        Ok(media.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.db().media.retain(|m| m.id != id);
        Ok(())
    }
}
