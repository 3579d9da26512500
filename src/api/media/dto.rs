use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::schema::media::{MediaOwner, MediaType};
use crate::shared::error::AppError;
use crate::shared::storage::UploadFile;

/// Fields of a `multipart/form-data` upload: `file`, `type`, and at most one
/// of `productId` / `userId`.
#[derive(Debug, Default)]
pub struct MediaUploadForm {
    pub file: Option<UploadFile>,
    pub media_type: Option<MediaType>,
    pub product_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl MediaUploadForm {
    /// Applies one text field; unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        match name {
            "type" => {
                self.media_type = Some(parse_media_type(value)?);
            }
            "productId" => self.product_id = Some(parse_id(name, value)?),
            "userId" => self.user_id = Some(parse_id(name, value)?),
            _ => {}
        }
        Ok(())
    }

    pub fn owner(&self) -> Result<Option<MediaOwner>, AppError> {
        owner_of(self.product_id, self.user_id)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaRequest {
    #[serde(rename = "type")]
    pub media_type: Option<MediaType>,
    pub product_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl UpdateMediaRequest {
    pub fn owner(&self) -> Result<Option<MediaOwner>, AppError> {
        owner_of(self.product_id, self.user_id)
    }
}

fn owner_of(product_id: Option<Uuid>, user_id: Option<Uuid>) -> Result<Option<MediaOwner>, AppError> {
    match (product_id, user_id) {
        (Some(_), Some(_)) => Err(AppError::bad_request(
            "Media belongs to either a product or a user, not both",
        )),
        (Some(id), None) => Ok(Some(MediaOwner::Product(id))),
        (None, Some(id)) => Ok(Some(MediaOwner::User(id))),
        (None, None) => Ok(None),
    }
}

fn parse_media_type(value: &str) -> Result<MediaType, AppError> {
    match value {
        "image" => Ok(MediaType::Image),
        "video" => Ok(MediaType::Video),
        other => Err(AppError::bad_request(format!(
            "type: must be image or video, got \"{other}\""
        ))),
    }
}

fn parse_id(field: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::bad_request(format!("{field}: invalid id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_fields_are_parsed_and_owner_is_exclusive() {
        let product = Uuid::new_v4();
        let mut form = MediaUploadForm::default();
        form.set_field("type", " video ").unwrap();
        form.set_field("productId", &product.to_string()).unwrap();
        form.set_field("caption", "ignored").unwrap();
        assert_eq!(form.media_type, Some(MediaType::Video));
        assert_eq!(form.owner().unwrap(), Some(MediaOwner::Product(product)));

        form.set_field("userId", &Uuid::new_v4().to_string()).unwrap();
        assert!(matches!(form.owner(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn bad_values_are_bad_requests() {
        let mut form = MediaUploadForm::default();
        assert!(form.set_field("type", "audio").is_err());
        assert!(form.set_field("userId", "42").is_err());
    }
}
