use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{AddToCartRequest, UpdateCartItemRequest};
use super::service::CartService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_auth, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn cart_routes(service: Arc<CartService>, keys: Arc<JwtKeys>) -> BoxedFilter<(impl Reply,)> {
    let list = warp::path!("v1" / "cart")
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(list_cart);

    let add = warp::path!("v1" / "cart")
        .and(warp::post())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_validated_body::<AddToCartRequest>())
        .and_then(add_to_cart);

    let update = warp::path!("v1" / "cart" / Uuid)
        .and(warp::patch())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateCartItemRequest>())
        .and_then(update_cart_item);

    let remove = warp::path!("v1" / "cart" / Uuid)
        .and(warp::delete())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(remove_cart_item);

    let clear = warp::path!("v1" / "cart")
        .and(warp::delete())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(clear_cart);

    let admin_view = warp::path!("v1" / "cart" / "admin" / Uuid)
        .and(warp::get())
        .and(with_role(keys, RoleName::Admin))
        .and(with_state(service))
        .and_then(admin_cart);

    list.or(add)
        .or(update)
        .or(remove)
        .or(clear)
        .or(admin_view)
        .boxed()
}

async fn list_cart(user: AuthUser, service: Arc<CartService>) -> Result<impl Reply, Rejection> {
    let items = service
        .list(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Cart fetched successfully", items))
}

async fn add_to_cart(
    user: AuthUser,
    service: Arc<CartService>,
    body: AddToCartRequest,
) -> Result<impl Reply, Rejection> {
    let item = service
        .add(user.user_id, body.product_id, body.quantity)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Product added to cart successfully", item))
}

async fn update_cart_item(
    id: Uuid,
    user: AuthUser,
    service: Arc<CartService>,
    body: UpdateCartItemRequest,
) -> Result<impl Reply, Rejection> {
    let item = service
        .update(user.user_id, id, body.quantity)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Cart item updated successfully", item))
}

async fn remove_cart_item(
    id: Uuid,
    user: AuthUser,
    service: Arc<CartService>,
) -> Result<impl Reply, Rejection> {
    service
        .remove(user.user_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Cart item removed successfully"))
}

async fn clear_cart(user: AuthUser, service: Arc<CartService>) -> Result<impl Reply, Rejection> {
    service
        .clear(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Cart cleared successfully"))
}

async fn admin_cart(
    user_id: Uuid,
    _admin: AuthUser,
    service: Arc<CartService>,
) -> Result<impl Reply, Rejection> {
    let items = service
        .list_for_admin(user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("User cart fetched successfully", items))
}
