use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{UpdateProfileRequest, UpdateRoleRequest};
use super::service::UserService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_auth, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn user_routes(service: Arc<UserService>, keys: Arc<JwtKeys>) -> BoxedFilter<(impl Reply,)> {
    let get_profile = warp::path!("v1" / "users" / "profile")
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(get_profile);

    let update_profile = warp::path!("v1" / "users" / "profile")
        .and(warp::patch())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateProfileRequest>())
        .and_then(update_profile);

    let delete_profile = warp::path!("v1" / "users" / "profile")
        .and(warp::delete())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(delete_profile);

    let list = warp::path!("v1" / "users")
        .and(warp::get())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(list_users);

    let update_role = warp::path!("v1" / "users" / Uuid / "role")
        .and(warp::patch())
        .and(with_role(keys, RoleName::Admin))
        .and(with_state(service))
        .and(with_validated_body::<UpdateRoleRequest>())
        .and_then(update_role);

    get_profile
        .or(update_profile)
        .or(delete_profile)
        .or(list)
        .or(update_role)
        .boxed()
}

async fn get_profile(user: AuthUser, service: Arc<UserService>) -> Result<impl Reply, Rejection> {
    let profile = service
        .profile(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Profile fetched successfully", profile))
}

async fn update_profile(
    user: AuthUser,
    service: Arc<UserService>,
    body: UpdateProfileRequest,
) -> Result<impl Reply, Rejection> {
    let profile = service
        .update_profile(user.user_id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Profile updated successfully", profile))
}

async fn delete_profile(user: AuthUser, service: Arc<UserService>) -> Result<impl Reply, Rejection> {
    service
        .delete_profile(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Account deleted successfully"))
}

async fn list_users(_admin: AuthUser, service: Arc<UserService>) -> Result<impl Reply, Rejection> {
    let users = service.list().await.map_err(warp::reject::custom)?;
    Ok(response::success("Users fetched successfully", users))
}

async fn update_role(
    id: Uuid,
    admin: AuthUser,
    service: Arc<UserService>,
    body: UpdateRoleRequest,
) -> Result<impl Reply, Rejection> {
    tracing::info!(admin_id = %admin.user_id, user_id = %id, "role change requested");
    let profile = service
        .update_roles(id, body.roles)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("User roles updated successfully", profile))
}
