use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use super::{StorageError, StorageProvider, UploadFile, UploadLimits, object_name, prepare_blocking};
use crate::shared::config::environment::S3Config;

pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    limits: UploadLimits,
}

impl S3Storage {
    pub fn new(config: &S3Config, limits: UploadLimits) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "storefront-env",
        );
        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            limits,
        }
    }

    fn base_url(&self) -> String {
        base_url(&self.bucket, &self.region)
    }
}

fn base_url(bucket: &str, region: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/")
}

fn key_from_url<'a>(base: &str, url: &'a str) -> Result<&'a str, StorageError> {
    url.strip_prefix(base)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| StorageError::InvalidKey(url.to_string()))
}

#[async_trait]
impl StorageProvider for S3Storage {
    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String, StorageError> {
        let file = prepare_blocking(file, self.limits).await?;
        let key = format!("{}/{}", folder.trim_matches('/'), object_name(&file.filename));
        let size = file.bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&file.content_type)
            .body(ByteStream::from(file.bytes))
            .send()
            .await
            .map_err(|e| StorageError::Remote(format!("S3 upload failed: {e}")))?;

        info!(bucket = %self.bucket, key = %key, bytes = size, "Uploaded object");
        Ok(format!("{}{key}", self.base_url()))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let base = self.base_url();
        let key = key_from_url(&base, url)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Remote(format!("S3 delete failed: {e}")))?;
        Ok(())
    }

    fn limits(&self) -> UploadLimits {
        self.limits
    }
}
