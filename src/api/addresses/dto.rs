use serde::Deserialize;
use validator::Validate;

use crate::schema::models::{AddressChanges, AddressType, NewAddress};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(max = 200))]
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 20))]
    pub zip_code: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    #[serde(default)]
    pub is_default: bool,
    #[validate(length(max = 500))]
    pub delivery_instructions: Option<String>,
    #[validate(length(max = 50))]
    pub label: Option<String>,
}

impl From<CreateAddressRequest> for NewAddress {
    fn from(req: CreateAddressRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            street: req.street,
            address_line2: req.address_line2,
            city: req.city,
            state: req.state,
            country: req.country,
            zip_code: req.zip_code,
            latitude: req.latitude,
            longitude: req.longitude,
            address_type: req.address_type.unwrap_or(AddressType::Shipping),
            is_default: req.is_default,
            delivery_instructions: req.delivery_instructions,
            label: req.label,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub street: Option<String>,
    #[validate(length(max = 200))]
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub zip_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub is_default: Option<bool>,
    #[validate(length(max = 500))]
    pub delivery_instructions: Option<String>,
    #[validate(length(max = 50))]
    pub label: Option<String>,
}

impl From<UpdateAddressRequest> for AddressChanges {
    fn from(req: UpdateAddressRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            street: req.street,
            address_line2: req.address_line2,
            city: req.city,
            state: req.state,
            country: req.country,
            zip_code: req.zip_code,
            latitude: req.latitude,
            longitude: req.longitude,
            address_type: req.address_type,
            is_default: req.is_default,
            delivery_instructions: req.delivery_instructions,
            label: req.label,
        }
    }
}
