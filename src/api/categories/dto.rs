use serde::Deserialize;
use validator::Validate;

use crate::schema::catalog::{CatalogChanges, CatalogStatus, NewCatalogEntry, PublishStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
}

impl From<CreateCategoryRequest> for NewCatalogEntry {
    fn from(req: CreateCategoryRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description,
            status: req.status.map_or(CatalogStatus::Active, Into::into),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
}

impl From<UpdateCategoryRequest> for CatalogChanges {
    fn from(req: UpdateCategoryRequest) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
            status: req.status.map(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_is_not_a_settable_status() {
        let parsed: Result<UpdateCategoryRequest, _> =
            serde_json::from_value(serde_json::json!({"status": "deleted"}));
        assert!(parsed.is_err());

        let req: CreateCategoryRequest =
            serde_json::from_value(serde_json::json!({"name": " Books "})).unwrap();
        let entry = NewCatalogEntry::from(req);
        assert_eq!(entry.name, "Books");
        assert_eq!(entry.status, CatalogStatus::Active);
    }
}
