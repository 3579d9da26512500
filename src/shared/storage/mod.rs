//! Object storage behind one interface: local disk or S3.
//!
//! Every upload goes through [`prepare`] first: the MIME type must be on the
//! allow list, images other than WebP are transcoded to WebP, and only then is
//! the per-class size ceiling checked.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::media::MediaType;
use crate::shared::config::environment::{StorageConfig, StorageDriver};
use crate::shared::error::AppError;

pub mod local;
pub mod s3;
pub mod transcode;

pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
pub const ALLOWED_VIDEO_TYPES: [&str; 2] = ["video/mp4", "video/webm"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("{kind} exceeds max size of {limit} bytes")]
    TooLarge { kind: &'static str, limit: u64 },
    #[error("Could not process image: {0}")]
    Transcode(String),
    #[error("Invalid file key: {0}")]
    InvalidKey(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object store error: {0}")]
    Remote(String),
    #[error("Upload processing task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedType(_) => AppError::UnsupportedMediaType(err.to_string()),
            StorageError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            StorageError::Transcode(_) => AppError::BadRequest(err.to_string()),
            other => {
                tracing::error!("storage failure: {other}");
                AppError::InternalServerError
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub image_max_bytes: u64,
    pub video_max_bytes: u64,
}

impl UploadLimits {
    /// Largest body any single upload may have before transcoding.
    pub fn max_request_bytes(&self) -> u64 {
        self.image_max_bytes.max(self.video_max_bytes)
    }
}

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Stores the file under `folder` and returns its public URL.
    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String, StorageError>;

    async fn upload_many(
        &self,
        files: Vec<UploadFile>,
        folder: &str,
    ) -> Result<Vec<String>, StorageError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            urls.push(self.upload(file, folder).await?);
        }
        Ok(urls)
    }

    /// Removes the object behind a URL previously returned by `upload`.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;

    fn limits(&self) -> UploadLimits;
}

pub fn build(config: &StorageConfig) -> Result<Arc<dyn StorageProvider>, StorageError> {
    let limits = UploadLimits {
        image_max_bytes: config.image_max_bytes,
        video_max_bytes: config.video_max_bytes,
    };
    match (config.driver, &config.s3) {
        (StorageDriver::S3, Some(s3)) => Ok(Arc::new(s3::S3Storage::new(s3, limits))),
        (StorageDriver::S3, None) => Err(StorageError::Remote(
            "S3 driver selected without bucket configuration".to_string(),
        )),
        (StorageDriver::Local, _) => Ok(Arc::new(local::LocalStorage::new(
            config.local_path.clone(),
            limits,
        ))),
    }
}

/// Media class of an allowed MIME type; `None` for anything else.
pub fn media_type_of(content_type: &str) -> Option<MediaType> {
    if ALLOWED_IMAGE_TYPES.contains(&content_type) {
        Some(MediaType::Image)
    } else if ALLOWED_VIDEO_TYPES.contains(&content_type) {
        Some(MediaType::Video)
    } else {
        None
    }
}

pub fn prepare(mut file: UploadFile, limits: &UploadLimits) -> Result<UploadFile, StorageError> {
    let kind = media_type_of(&file.content_type)
        .ok_or_else(|| StorageError::UnsupportedType(file.content_type.clone()))?;

    if kind == MediaType::Image && file.content_type != "image/webp" {
        file.bytes = transcode::to_webp(&file.bytes)?;
        file.content_type = "image/webp".to_string();
        file.filename = webp_filename(&file.filename);
    }

    let (label, limit) = match kind {
        MediaType::Image => ("Image", limits.image_max_bytes),
        MediaType::Video => ("Video", limits.video_max_bytes),
    };
    if file.bytes.len() as u64 > limit {
        return Err(StorageError::TooLarge { kind: label, limit });
    }
    Ok(file)
}

/// [`prepare`] on the blocking pool; decoding and encoding large images would
/// otherwise stall the async worker.
pub async fn prepare_blocking(
    file: UploadFile,
    limits: UploadLimits,
) -> Result<UploadFile, StorageError> {
    tokio::task::spawn_blocking(move || prepare(file, &limits)).await?
}

/// `{millis}-{name}` with path separators and odd characters stripped.
pub fn object_name(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let clean = clean.trim_start_matches('.');
    let clean = if clean.is_empty() { "file" } else { clean };
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), clean)
}

fn webp_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if ["jpg", "jpeg", "png"].contains(&ext.to_ascii_lowercase().as_str()) =>
        {
            format!("{stem}.webp")
        }
        _ => format!("{filename}.webp"),
    }
}
