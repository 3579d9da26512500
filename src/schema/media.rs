use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(sqlx::Type, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "media_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn matches_mime(&self, mime: &str) -> bool {
        match self {
            MediaType::Image => mime.starts_with("image/"),
            MediaType::Video => mime.starts_with("video/"),
        }
    }
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "media_owner_kind", rename_all = "lowercase")]
pub enum MediaOwnerKind {
    Product,
    User,
}

/// What a media file is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum MediaOwner {
    Product(Uuid),
    User(Uuid),
}

impl MediaOwner {
    pub fn parts(&self) -> (MediaOwnerKind, Uuid) {
        match *self {
            MediaOwner::Product(id) => (MediaOwnerKind::Product, id),
            MediaOwner::User(id) => (MediaOwnerKind::User, id),
        }
    }

    pub fn from_parts(kind: MediaOwnerKind, id: Uuid) -> Self {
        match kind {
            MediaOwnerKind::Product => MediaOwner::Product(id),
            MediaOwnerKind::User => MediaOwner::User(id),
        }
    }

    /// Storage folder for files attached to this owner.
    pub fn folder(&self) -> String {
        match self {
            MediaOwner::Product(id) => format!("products/{id}"),
            MediaOwner::User(id) => format!("users/{id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub owner: MediaOwner,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct MediaRow {
    pub id: Uuid,
    pub url: String,
    pub media_type: MediaType,
    pub owner_kind: MediaOwnerKind,
    pub owner_id: Uuid,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            media_type: row.media_type,
            owner: MediaOwner::from_parts(row.owner_kind, row.owner_id),
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub url: String,
    pub media_type: MediaType,
    pub owner: MediaOwner,
    pub uploaded_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct MediaChanges {
    pub media_type: Option<MediaType>,
    pub owner: Option<MediaOwner>,
}
