use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::schema::catalog::{CatalogStatus, NewProduct, ProductChanges, PublishStatus};

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("range").with_message("Price must be non-negative".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = "non_negative_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Quantity must be non-negative"))]
    pub quantity: i32,
    pub status: Option<PublishStatus>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description,
            price: req.price.round_dp(2),
            quantity: req.quantity,
            status: req.status.map_or(CatalogStatus::Active, Into::into),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = "non_negative_price"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Quantity must be non-negative"))]
    pub quantity: Option<i32>,
    pub status: Option<PublishStatus>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
            price: req.price.map(|p| p.round_dp(2)),
            quantity: req.quantity,
            status: req.status.map(Into::into),
        }
    }
}
