use std::sync::Arc;

use bytes::BufMut;
use futures_util::TryStreamExt;
use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::multipart::{FormData, Part};
use warp::{Filter, Rejection, Reply};

use super::dto::{MediaUploadForm, UpdateMediaRequest};
use super::service::MediaService;
use crate::schema::models::RoleName;
use crate::shared::error::AppError;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_auth, with_role};
use crate::shared::storage::UploadFile;
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

/// Headroom for the text fields next to the largest allowed file.
const FORM_OVERHEAD: u64 = 64 * 1024;

pub fn media_routes(service: Arc<MediaService>, keys: Arc<JwtKeys>) -> BoxedFilter<(impl Reply,)> {
    let max_length = service.limits().max_request_bytes() + FORM_OVERHEAD;

    let upload = warp::path!("v1" / "media")
        .and(warp::post())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_upload_form(max_length))
        .and_then(upload_media);

    let list = warp::path!("v1" / "media")
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(list_media);

    let get = warp::path!("v1" / "media" / Uuid)
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(get_media);

    let update = warp::path!("v1" / "media" / Uuid)
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateMediaRequest>())
        .and_then(update_media);

    let delete = warp::path!("v1" / "media" / Uuid)
        .and(warp::delete())
        .and(with_auth(keys))
        .and(with_state(service))
        .and_then(delete_media);

    upload.or(list).or(get).or(update).or(delete).boxed()
}

fn with_upload_form(
    max_length: u64,
) -> impl Filter<Extract = (MediaUploadForm,), Error = Rejection> + Clone {
    warp::multipart::form()
        .max_length(max_length)
        .and_then(|form: FormData| async move {
            read_form(form).await.map_err(warp::reject::custom)
        })
}

/// Parts must be drained in order; the next part is only valid once the
/// previous one has been read.
async fn read_form(form: FormData) -> Result<MediaUploadForm, AppError> {
    let mut form = std::pin::pin!(form);
    let mut upload = MediaUploadForm::default();
    while let Some(part) = form.try_next().await.map_err(malformed)? {
        let name = part.name().to_string();
        if name == "file" {
            let filename = part.filename().unwrap_or("upload").to_string();
            let content_type = part
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = read_part(part).await?;
            upload.file = Some(UploadFile {
                filename,
                content_type,
                bytes,
            });
        } else if part.filename().is_none() {
            let bytes = read_part(part).await?;
            let text = String::from_utf8(bytes)
                .map_err(|_| AppError::bad_request(format!("{name}: must be text")))?;
            upload.set_field(&name, &text)?;
        }
    }
    Ok(upload)
}

async fn read_part(part: Part) -> Result<Vec<u8>, AppError> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, data| {
            acc.put(data);
            async move { Ok(acc) }
        })
        .await
        .map_err(malformed)
}

fn malformed(err: warp::Error) -> AppError {
    AppError::bad_request(format!("Malformed multipart body: {err}"))
}

async fn upload_media(
    user: AuthUser,
    service: Arc<MediaService>,
    form: MediaUploadForm,
) -> Result<impl Reply, Rejection> {
    let is_admin = user.has_role(RoleName::Admin);
    let media = service
        .upload(user.user_id, is_admin, form)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Media uploaded successfully", media))
}

async fn list_media(service: Arc<MediaService>) -> Result<impl Reply, Rejection> {
    let media = service.list().await.map_err(warp::reject::custom)?;
    Ok(response::success("Media fetched successfully", media))
}

async fn get_media(id: Uuid, service: Arc<MediaService>) -> Result<impl Reply, Rejection> {
    let media = service.get(id).await.map_err(warp::reject::custom)?;
    Ok(response::success("Media fetched successfully", media))
}

async fn update_media(
    id: Uuid,
    _admin: AuthUser,
    service: Arc<MediaService>,
    body: UpdateMediaRequest,
) -> Result<impl Reply, Rejection> {
    let media = service
        .update(id, body)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Media updated successfully", media))
}

async fn delete_media(
    id: Uuid,
    user: AuthUser,
    service: Arc<MediaService>,
) -> Result<impl Reply, Rejection> {
    service
        .delete(user.user_id, user.has_role(RoleName::Admin), id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Media deleted successfully"))
}
