use serde::Deserialize;
use validator::Validate;

use crate::schema::catalog::{CatalogChanges, CatalogStatus, NewCatalogEntry, PublishStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubcategoryRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
}

impl From<CreateSubcategoryRequest> for NewCatalogEntry {
    fn from(req: CreateSubcategoryRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description,
            status: req.status.map_or(CatalogStatus::Active, Into::into),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSubcategoryRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
}

impl From<UpdateSubcategoryRequest> for CatalogChanges {
    fn from(req: UpdateSubcategoryRequest) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
            status: req.status.map(Into::into),
        }
    }
}
