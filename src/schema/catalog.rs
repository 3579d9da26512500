use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{SoftDeletable, is_visible};

// --------------------------------
// Catalog status (Postgres enum type), shared by all three levels
// --------------------------------
#[derive(sqlx::Type, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "catalog_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    Active,
    Inactive,
    Deleted,
}

/// The statuses a client may set directly; `deleted` only comes from a delete.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Active,
    Inactive,
}

impl From<PublishStatus> for CatalogStatus {
    fn from(status: PublishStatus) -> Self {
        match status {
            PublishStatus::Active => CatalogStatus::Active,
            PublishStatus::Inactive => CatalogStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for Category {
    fn is_deleted(&self) -> bool {
        self.status == CatalogStatus::Deleted || self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for Subcategory {
    fn is_deleted(&self) -> bool {
        self.status == CatalogStatus::Deleted || self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone)]
pub struct NewCatalogEntry {
    pub name: String,
    pub description: Option<String>,
    pub status: CatalogStatus,
}

/// Name/description/status edit shared by categories and subcategories.
#[derive(Debug, Clone, Default)]
pub struct CatalogChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<CatalogStatus>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub subcategory_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for Product {
    fn is_deleted(&self) -> bool {
        self.status == CatalogStatus::Deleted || self.deleted_at.is_some()
    }
}

/// A product joined with the two ancestors that decide its visibility.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithRelations {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
    pub subcategory: Subcategory,
}

impl ProductWithRelations {
    pub fn is_visible(&self) -> bool {
        is_visible(&[&self.product, &self.subcategory, &self.category])
    }

    /// Visible and switched on: the only state in which it can be ordered.
    pub fn is_purchasable(&self) -> bool {
        self.is_visible() && self.product.status == CatalogStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub status: CatalogStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub status: Option<CatalogStatus>,
}

// --------------------------------
// Inventory audit
// --------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub id: Uuid,
    pub product_id: Uuid,
    pub previous_quantity: i32,
    pub quantity: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> ProductWithRelations {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Electronics".into(),
            description: None,
            status: CatalogStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let subcategory = Subcategory {
            id: Uuid::new_v4(),
            category_id: category.id,
            name: "Phones".into(),
            description: None,
            status: CatalogStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let product = Product {
            id: Uuid::new_v4(),
            category_id: category.id,
            subcategory_id: subcategory.id,
            name: "Phone".into(),
            description: None,
            price: Decimal::new(29999, 2),
            quantity: 3,
            status: CatalogStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        ProductWithRelations {
            product,
            category,
            subcategory,
        }
    }

    #[test]
    fn deleted_ancestor_hides_product() {
        let mut p = fixture();
        assert!(p.is_visible());
        p.category.status = CatalogStatus::Deleted;
        assert!(!p.is_visible());

        let mut p = fixture();
        p.subcategory.deleted_at = Some(Utc::now());
        assert!(!p.is_visible());
    }

    #[test]
    fn inactive_product_is_visible_but_not_purchasable() {
        let mut p = fixture();
        p.product.status = CatalogStatus::Inactive;
        assert!(p.is_visible());
        assert!(!p.is_purchasable());
    }

    #[test]
    fn serializes_with_embedded_relations() {
        let json = serde_json::to_value(fixture()).unwrap();
        assert_eq!(json["price"], "299.99");
        assert_eq!(json["category"]["name"], "Electronics");
        assert_eq!(json["subcategory"]["name"], "Phones");
    }
}
