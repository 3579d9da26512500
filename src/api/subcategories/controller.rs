use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{CreateSubcategoryRequest, UpdateSubcategoryRequest};
use super::service::SubcategoryService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn subcategory_routes(
    service: Arc<SubcategoryService>,
    keys: Arc<JwtKeys>,
) -> BoxedFilter<(impl Reply,)> {
    let list = warp::path!("categories" / Uuid / "subcategories")
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(list_subcategories);

    let get = warp::path!("categories" / Uuid / "subcategories" / Uuid)
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(get_subcategory);

    let create = warp::path!("categories" / Uuid / "subcategories")
        .and(warp::post())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<CreateSubcategoryRequest>())
        .and_then(create_subcategory);

    let update = warp::path!("categories" / Uuid / "subcategories" / Uuid)
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateSubcategoryRequest>())
        .and_then(update_subcategory);

    let delete = warp::path!("categories" / Uuid / "subcategories" / Uuid)
        .and(warp::delete())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(delete_subcategory);

    let deactivate = warp::path!("categories" / Uuid / "subcategories" / Uuid / "deactivate")
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(deactivate_subcategory);

    let activate = warp::path!("categories" / Uuid / "subcategories" / Uuid / "activate")
        .and(warp::patch())
        .and(with_role(keys, RoleName::Admin))
        .and(with_state(service))
        .and_then(activate_subcategory);

    list.or(get)
        .or(create)
        .or(update)
        .or(delete)
        .or(deactivate)
        .or(activate)
        .boxed()
}

async fn list_subcategories(
    category_id: Uuid,
    service: Arc<SubcategoryService>,
) -> Result<impl Reply, Rejection> {
    let subcategories = service
        .list(category_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success(
        "Subcategories fetched successfully",
        subcategories,
    ))
}

async fn get_subcategory(
    category_id: Uuid,
    id: Uuid,
    service: Arc<SubcategoryService>,
) -> Result<impl Reply, Rejection> {
    let subcategory = service
        .get(category_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Subcategory fetched successfully", subcategory))
}

async fn create_subcategory(
    category_id: Uuid,
    _admin: AuthUser,
    service: Arc<SubcategoryService>,
    body: CreateSubcategoryRequest,
) -> Result<impl Reply, Rejection> {
    let subcategory = service
        .create(category_id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Subcategory created successfully", subcategory))
}

async fn update_subcategory(
    category_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<SubcategoryService>,
    body: UpdateSubcategoryRequest,
) -> Result<impl Reply, Rejection> {
    let subcategory = service
        .update(category_id, id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Subcategory updated successfully", subcategory))
}

async fn delete_subcategory(
    category_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<SubcategoryService>,
) -> Result<impl Reply, Rejection> {
    service
        .delete(category_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Subcategory deleted successfully"))
}

async fn deactivate_subcategory(
    category_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<SubcategoryService>,
) -> Result<impl Reply, Rejection> {
    let subcategory = service
        .deactivate(category_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success(
        "Subcategory deactivated successfully",
        subcategory,
    ))
}

async fn activate_subcategory(
    category_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<SubcategoryService>,
) -> Result<impl Reply, Rejection> {
    let subcategory = service
        .activate(category_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success(
        "Subcategory activated successfully",
        subcategory,
    ))
}
