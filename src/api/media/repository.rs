use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::schema::media::{Media, MediaChanges, MediaRow, NewMedia};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, media: NewMedia) -> Result<Media, RepositoryError>;
    async fn list(&self) -> Result<Vec<Media>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Media>, RepositoryError>;
    async fn update(&self, id: Uuid, changes: MediaChanges) -> Result<Media, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn create(&self, media: NewMedia) -> Result<Media, RepositoryError> {
        let (owner_kind, owner_id) = media.owner.parts();
        let row = sqlx::query_as::<_, MediaRow>(
            "INSERT INTO media (id, url, media_type, owner_kind, owner_id, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(media.url)
        .bind(media.media_type)
        .bind(owner_kind)
        .bind(owner_id)
        .bind(media.uploaded_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list(&self) -> Result<Vec<Media>, RepositoryError> {
        let rows = sqlx::query_as::<_, MediaRow>("SELECT * FROM media ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Media>, RepositoryError> {
        let row = sqlx::query_as::<_, MediaRow>("SELECT * FROM media WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn update(&self, id: Uuid, changes: MediaChanges) -> Result<Media, RepositoryError> {
        let (owner_kind, owner_id) = match changes.owner {
            Some(owner) => {
                let (kind, id) = owner.parts();
                (Some(kind), Some(id))
            }
            None => (None, None),
        };
        let row = sqlx::query_as::<_, MediaRow>(
            "UPDATE media SET
                media_type = COALESCE($2, media_type),
                owner_kind = COALESCE($3, owner_kind),
                owner_id = COALESCE($4, owner_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.media_type)
        .bind(owner_kind)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
