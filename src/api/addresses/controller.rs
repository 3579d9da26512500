use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{CreateAddressRequest, UpdateAddressRequest};
use super::service::AddressService;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_auth};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn address_routes(
    service: Arc<AddressService>,
    keys: Arc<JwtKeys>,
) -> BoxedFilter<(impl Reply,)> {
    let create = warp::path!("v1" / "addresses")
        .and(warp::post())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_validated_body::<CreateAddressRequest>())
        .and_then(create_address);

    let list = warp::path!("v1" / "addresses")
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(list_addresses);

    let get = warp::path!("v1" / "addresses" / Uuid)
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(get_address);

    let update = warp::path!("v1" / "addresses" / Uuid)
        .and(warp::patch())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateAddressRequest>())
        .and_then(update_address);

    let delete = warp::path!("v1" / "addresses" / Uuid)
        .and(warp::delete())
        .and(with_auth(keys))
        .and(with_state(service))
        .and_then(delete_address);

    create.or(list).or(get).or(update).or(delete).boxed()
}

async fn create_address(
    user: AuthUser,
    service: Arc<AddressService>,
    body: CreateAddressRequest,
) -> Result<impl Reply, Rejection> {
    let address = service
        .create(user.user_id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Address created successfully", address))
}

async fn list_addresses(
    user: AuthUser,
    service: Arc<AddressService>,
) -> Result<impl Reply, Rejection> {
    let addresses = service
        .list(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Addresses fetched successfully", addresses))
}

async fn get_address(
    id: Uuid,
    user: AuthUser,
    service: Arc<AddressService>,
) -> Result<impl Reply, Rejection> {
    let address = service
        .get(user.user_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Address fetched successfully", address))
}

async fn update_address(
    id: Uuid,
    user: AuthUser,
    service: Arc<AddressService>,
    body: UpdateAddressRequest,
) -> Result<impl Reply, Rejection> {
    let address = service
        .update(user.user_id, id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Address updated successfully", address))
}

async fn delete_address(
    id: Uuid,
    user: AuthUser,
    service: Arc<AddressService>,
) -> Result<impl Reply, Rejection> {
    service
        .delete(user.user_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Address deleted successfully"))
}
