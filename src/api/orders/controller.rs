use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{CreateOrderRequest, UpdateOrderStatusRequest};
use super::service::OrderService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_auth, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn order_routes(service: Arc<OrderService>, keys: Arc<JwtKeys>) -> BoxedFilter<(impl Reply,)> {
    let create = warp::path!("v1" / "orders")
        .and(warp::post())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_validated_body::<CreateOrderRequest>())
        .and_then(create_order);

    let list = warp::path!("v1" / "orders")
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(list_orders);

    let get = warp::path!("v1" / "orders" / Uuid)
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(get_order);

    let update_status = warp::path!("v1" / "orders" / Uuid / "status")
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateOrderStatusRequest>())
        .and_then(update_order_status);

    let cancel = warp::path!("v1" / "orders" / Uuid / "cancel")
        .and(warp::patch())
        .and(with_auth(keys))
        .and(with_state(service))
        .and_then(cancel_order);

    create
        .or(list)
        .or(get)
        .or(update_status)
        .or(cancel)
        .boxed()
}

async fn create_order(
    user: AuthUser,
    service: Arc<OrderService>,
    body: CreateOrderRequest,
) -> Result<impl Reply, Rejection> {
    let lines = body
        .items
        .into_iter()
        .map(|item| (item.product_id, item.quantity))
        .collect();
    let order = service
        .create(user.user_id, lines)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Order created successfully", order))
}

async fn list_orders(user: AuthUser, service: Arc<OrderService>) -> Result<impl Reply, Rejection> {
    let orders = service
        .list(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Orders fetched successfully", orders))
}

async fn get_order(
    id: Uuid,
    user: AuthUser,
    service: Arc<OrderService>,
) -> Result<impl Reply, Rejection> {
    let order = service
        .get(user.user_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Order fetched successfully", order))
}

async fn update_order_status(
    id: Uuid,
    _admin: AuthUser,
    service: Arc<OrderService>,
    body: UpdateOrderStatusRequest,
) -> Result<impl Reply, Rejection> {
    let order = service
        .update_status(id, body.status)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Order status updated successfully", order))
}

async fn cancel_order(
    id: Uuid,
    user: AuthUser,
    service: Arc<OrderService>,
) -> Result<impl Reply, Rejection> {
    let order = service
        .cancel(user.user_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Order cancelled successfully", order))
}
