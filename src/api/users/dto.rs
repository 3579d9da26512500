use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::schema::models::{ProfileChanges, RoleName};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,
    pub dob: Option<NaiveDate>,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            username: req.username,
            dob: req.dob,
            phone: req.phone,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, message = "at least one role is required"))]
    pub roles: Vec<RoleName>,
}
