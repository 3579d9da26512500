use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{CreateCategoryRequest, UpdateCategoryRequest};
use super::service::CategoryService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn category_routes(
    service: Arc<CategoryService>,
    keys: Arc<JwtKeys>,
) -> BoxedFilter<(impl Reply,)> {
    let list = warp::path!("categories")
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(list_categories);

    let get = warp::path!("categories" / Uuid)
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(get_category);

    let create = warp::path!("categories")
        .and(warp::post())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<CreateCategoryRequest>())
        .and_then(create_category);

    let update = warp::path!("categories" / Uuid)
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateCategoryRequest>())
        .and_then(update_category);

    let delete = warp::path!("categories" / Uuid)
        .and(warp::delete())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(delete_category);

    let deactivate = warp::path!("categories" / Uuid / "deactivate")
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(deactivate_category);

    let activate = warp::path!("categories" / Uuid / "activate")
        .and(warp::patch())
        .and(with_role(keys, RoleName::Admin))
        .and(with_state(service))
        .and_then(activate_category);

    list.or(get)
        .or(create)
        .or(update)
        .or(delete)
        .or(deactivate)
        .or(activate)
        .boxed()
}

async fn list_categories(service: Arc<CategoryService>) -> Result<impl Reply, Rejection> {
    let categories = service.list().await.map_err(warp::reject::custom)?;
    Ok(response::success("Categories fetched successfully", categories))
}

async fn get_category(id: Uuid, service: Arc<CategoryService>) -> Result<impl Reply, Rejection> {
    let category = service.get(id).await.map_err(warp::reject::custom)?;
    Ok(response::success("Category fetched successfully", category))
}

async fn create_category(
    _admin: AuthUser,
    service: Arc<CategoryService>,
    body: CreateCategoryRequest,
) -> Result<impl Reply, Rejection> {
    let category = service
        .create(body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Category created successfully", category))
}

async fn update_category(
    id: Uuid,
    _admin: AuthUser,
    service: Arc<CategoryService>,
    body: UpdateCategoryRequest,
) -> Result<impl Reply, Rejection> {
    let category = service
        .update(id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Category updated successfully", category))
}

async fn delete_category(
    id: Uuid,
    _admin: AuthUser,
    service: Arc<CategoryService>,
) -> Result<impl Reply, Rejection> {
    service.delete(id).await.map_err(warp::reject::custom)?;
    Ok(response::message("Category deleted successfully"))
}

async fn deactivate_category(
    id: Uuid,
    _admin: AuthUser,
    service: Arc<CategoryService>,
) -> Result<impl Reply, Rejection> {
    let category = service.deactivate(id).await.map_err(warp::reject::custom)?;
    Ok(response::success("Category deactivated successfully", category))
}

async fn activate_category(
    id: Uuid,
    _admin: AuthUser,
    service: Arc<CategoryService>,
) -> Result<impl Reply, Rejection> {
    let category = service.activate(id).await.map_err(warp::reject::custom)?;
    Ok(response::success("Category activated successfully", category))
}
