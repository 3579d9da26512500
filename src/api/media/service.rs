use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dto::{MediaUploadForm, UpdateMediaRequest};
use super::repository::MediaRepository;
use crate::api::products::repository::ProductRepository;
use crate::api::users::repository::UserRepository;
use crate::schema::catalog::ProductWithRelations;
use crate::schema::media::{Media, MediaChanges, MediaOwner, NewMedia};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;
use crate::shared::storage::{StorageProvider, UploadLimits};

const TYPE_MISMATCH: &str = "File type does not match specified media type";

pub struct MediaService {
    repo: Arc<dyn MediaRepository>,
    storage: Arc<dyn StorageProvider>,
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
}

impl MediaService {
    pub fn new(
        repo: Arc<dyn MediaRepository>,
        storage: Arc<dyn StorageProvider>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            repo,
            storage,
            products,
            users,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.storage.limits()
    }

    async fn existing(&self, id: Uuid) -> Result<Media, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Media not found"))
    }

    /// The owner must exist: a visible product or a user that is not deleted.
    async fn check_owner(&self, owner: MediaOwner) -> Result<(), AppError> {
        match owner {
            MediaOwner::Product(id) => {
                self.products
                    .find_by_id(id)
                    .await?
                    .filter(ProductWithRelations::is_visible)
                    .ok_or_else(|| AppError::not_found("Product not found"))?;
            }
            MediaOwner::User(id) => {
                self.users
                    .find_by_id(id)
                    .await?
                    .filter(|u| !u.is_deleted())
                    .ok_or_else(|| AppError::not_found("User not found"))?;
            }
        }
        Ok(())
    }

    /// Stores the file under its owner's folder and records it. Without an
    /// explicit owner the media is attached to the uploader.
    pub async fn upload(
        &self,
        uploader: Uuid,
        is_admin: bool,
        form: MediaUploadForm,
    ) -> Result<Media, AppError> {
        let owner = form.owner()?.unwrap_or(MediaOwner::User(uploader));
        let file = form
            .file
            .ok_or_else(|| AppError::bad_request("File not provided"))?;
        let media_type = form
            .media_type
            .ok_or_else(|| AppError::bad_request("type: must be image or video"))?;

        let mime = file.content_type.as_str();
        if !mime.starts_with("image/") && !mime.starts_with("video/") {
            return Err(AppError::bad_request("File must be an image or video"));
        }
        if !media_type.matches_mime(mime) {
            return Err(AppError::bad_request(TYPE_MISMATCH));
        }
        if matches!(owner, MediaOwner::User(id) if id != uploader) && !is_admin {
            return Err(AppError::forbidden(
                "You can only upload media for your own account",
            ));
        }
        self.check_owner(owner).await?;

        let url = self.storage.upload(file, &owner.folder()).await?;
        let created = self
            .repo
            .create(NewMedia {
                url: url.clone(),
                media_type,
                owner,
                uploaded_by: uploader,
            })
            .await;
        let media = match created {
            Ok(media) => media,
            Err(err) => {
                if let Err(cleanup) = self.storage.delete(&url).await {
                    warn!(url = %url, error = %cleanup, "orphaned upload left in storage");
                }
                return Err(err.into());
            }
        };
        info!(media_id = %media.id, %uploader, url = %media.url, "media uploaded");
        Ok(media)
    }

    pub async fn list(&self) -> Result<Vec<Media>, AppError> {
        let media = self.repo.list().await?;
        debug!(count = media.len(), "media listed");
        Ok(media)
    }

    pub async fn get(&self, id: Uuid) -> Result<Media, AppError> {
        self.existing(id).await
    }

    /// Rewrites the record only; the stored object keeps its URL.
    pub async fn update(&self, id: Uuid, dto: UpdateMediaRequest) -> Result<Media, AppError> {
        self.existing(id).await?;
        let owner = dto.owner()?;
        if let Some(owner) = owner {
            self.check_owner(owner).await?;
        }
        let media = self
            .repo
            .update(
                id,
                MediaChanges {
                    media_type: dto.media_type,
                    owner,
                },
            )
            .await?;
        info!(media_id = %id, "media updated");
        Ok(media)
    }

    /// Only the uploader or an admin may delete. The stored object goes
    /// first, then the record.
    pub async fn delete(&self, caller: Uuid, is_admin: bool, id: Uuid) -> Result<(), AppError> {
        let media = self.existing(id).await?;
        if !is_admin && media.uploaded_by != caller {
            return Err(AppError::forbidden("You can only delete your own media"));
        }
        self.storage.delete(&media.url).await?;
        self.repo.delete(id).await?;
        info!(media_id = %id, %caller, "media deleted");
        Ok(())
    }
}
