use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::schema::catalog::{
    CatalogStatus, Category, NewProduct, Product, ProductChanges, ProductWithRelations,
    Subcategory,
};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_for_subcategory(
        &self,
        subcategory_id: Uuid,
    ) -> Result<Vec<ProductWithRelations>, RepositoryError>;
    /// Every product row, deleted ones included, with its ancestors.
    async fn list_all(&self) -> Result<Vec<ProductWithRelations>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductWithRelations>, RepositoryError>;
    async fn name_exists(
        &self,
        subcategory_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, RepositoryError>;
    async fn create(
        &self,
        category_id: Uuid,
        subcategory_id: Uuid,
        product: NewProduct,
    ) -> Result<Product, RepositoryError>;
    async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Product, RepositoryError>;
    async fn soft_delete(&self, id: Uuid) -> Result<Product, RepositoryError>;
}

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_WITH_RELATIONS: &str = "
    SELECT p.*,
        c.name AS c_name, c.description AS c_description, c.status AS c_status,
        c.created_at AS c_created_at, c.updated_at AS c_updated_at, c.deleted_at AS c_deleted_at,
        s.name AS s_name, s.description AS s_description, s.status AS s_status,
        s.created_at AS s_created_at, s.updated_at AS s_updated_at, s.deleted_at AS s_deleted_at
    FROM products p
    JOIN categories c ON c.id = p.category_id
    JOIN subcategories s ON s.id = p.subcategory_id";

/// Flat join row; ancestor columns carry `c_` / `s_` prefixes.
#[derive(FromRow)]
struct ProductJoinRow {
    id: Uuid,
    category_id: Uuid,
    subcategory_id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    quantity: i32,
    status: CatalogStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    c_name: String,
    c_description: Option<String>,
    c_status: CatalogStatus,
    c_created_at: DateTime<Utc>,
    c_updated_at: DateTime<Utc>,
    c_deleted_at: Option<DateTime<Utc>>,
    s_name: String,
    s_description: Option<String>,
    s_status: CatalogStatus,
    s_created_at: DateTime<Utc>,
    s_updated_at: DateTime<Utc>,
    s_deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductJoinRow> for ProductWithRelations {
    fn from(r: ProductJoinRow) -> Self {
        Self {
            category: Category {
                id: r.category_id,
                name: r.c_name,
                description: r.c_description,
                status: r.c_status,
                created_at: r.c_created_at,
                updated_at: r.c_updated_at,
                deleted_at: r.c_deleted_at,
            },
            subcategory: Subcategory {
                id: r.subcategory_id,
                category_id: r.category_id,
                name: r.s_name,
                description: r.s_description,
                status: r.s_status,
                created_at: r.s_created_at,
                updated_at: r.s_updated_at,
                deleted_at: r.s_deleted_at,
            },
            product: Product {
                id: r.id,
                category_id: r.category_id,
                subcategory_id: r.subcategory_id,
                name: r.name,
                description: r.description,
                price: r.price,
                quantity: r.quantity,
                status: r.status,
                created_at: r.created_at,
                updated_at: r.updated_at,
                deleted_at: r.deleted_at,
            },
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list_for_subcategory(
        &self,
        subcategory_id: Uuid,
    ) -> Result<Vec<ProductWithRelations>, RepositoryError> {
        let sql = format!(
            "{SELECT_WITH_RELATIONS}
             WHERE p.subcategory_id = $1 AND p.deleted_at IS NULL AND p.status <> 'deleted'
             ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProductJoinRow>(&sql)
            .bind(subcategory_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<ProductWithRelations>, RepositoryError> {
        let sql = format!("{SELECT_WITH_RELATIONS} ORDER BY p.name");
        let rows = sqlx::query_as::<_, ProductJoinRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductWithRelations>, RepositoryError> {
        let sql = format!("{SELECT_WITH_RELATIONS} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductJoinRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn name_exists(
        &self,
        subcategory_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM products
                WHERE subcategory_id = $1 AND LOWER(name) = LOWER($2)
                  AND deleted_at IS NULL AND status <> 'deleted'
                  AND ($3::uuid IS NULL OR id <> $3)
             )",
        )
        .bind(subcategory_id)
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(
        &self,
        category_id: Uuid,
        subcategory_id: Uuid,
        p: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, category_id, subcategory_id, name, description, price, quantity, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(subcategory_id)
        .bind(p.name)
        .bind(p.description)
        .bind(p.price)
        .bind(p.quantity)
        .bind(p.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, c: ProductChanges) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            "UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                quantity = COALESCE($5, quantity),
                status = COALESCE($6, status),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(c.name)
        .bind(c.description)
        .bind(c.price)
        .bind(c.quantity)
        .bind(c.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            "UPDATE products SET status = $2, deleted_at = NOW(), updated_at = NOW()
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
