use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{CreatePaymentRequest, UpdatePaymentStatusRequest};
use super::service::PaymentService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_auth, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn payment_routes(
    service: Arc<PaymentService>,
    keys: Arc<JwtKeys>,
) -> BoxedFilter<(impl Reply,)> {
    let create = warp::path!("v1" / "payments")
        .and(warp::post())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and(with_validated_body::<CreatePaymentRequest>())
        .and_then(create_payment);

    let list = warp::path!("v1" / "payments")
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(list_payments);

    let get = warp::path!("v1" / "payments" / Uuid)
        .and(warp::get())
        .and(with_auth(keys.clone()))
        .and(with_state(service.clone()))
        .and_then(get_payment);

    let update_status = warp::path!("v1" / "payments" / Uuid / "status")
        .and(warp::patch())
        .and(with_role(keys, RoleName::Admin))
        .and(with_state(service))
        .and(with_validated_body::<UpdatePaymentStatusRequest>())
        .and_then(update_payment_status);

    create.or(list).or(get).or(update_status).boxed()
}

async fn create_payment(
    user: AuthUser,
    service: Arc<PaymentService>,
    body: CreatePaymentRequest,
) -> Result<impl Reply, Rejection> {
    let payment = service
        .create(user.user_id, body.order_id, body.method)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Payment created successfully", payment))
}

async fn list_payments(
    user: AuthUser,
    service: Arc<PaymentService>,
) -> Result<impl Reply, Rejection> {
    let payments = service
        .list(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Payments fetched successfully", payments))
}

async fn get_payment(
    id: Uuid,
    user: AuthUser,
    service: Arc<PaymentService>,
) -> Result<impl Reply, Rejection> {
    let payment = service
        .get(user.user_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Payment fetched successfully", payment))
}

async fn update_payment_status(
    id: Uuid,
    admin: AuthUser,
    service: Arc<PaymentService>,
    body: UpdatePaymentStatusRequest,
) -> Result<impl Reply, Rejection> {
    tracing::debug!(admin_id = %admin.user_id, payment_id = %id, "payment status change");
    let payment = service
        .update_status(id, body.status)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Payment status updated successfully", payment))
}
