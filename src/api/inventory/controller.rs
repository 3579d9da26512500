use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::UpdateInventoryRequest;
use super::service::InventoryService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn inventory_routes(
    service: Arc<InventoryService>,
    keys: Arc<JwtKeys>,
) -> BoxedFilter<(impl Reply,)> {
    let list = warp::path!("v1" / "inventory")
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(list_inventory);

    let get = warp::path!("v1" / "inventory" / Uuid)
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(get_inventory);

    let history = warp::path!("v1" / "inventory" / Uuid / "history")
        .and(warp::get())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(stock_history);

    let update = warp::path!("v1" / "inventory" / Uuid)
        .and(warp::patch())
        .and(with_role(keys, RoleName::Admin))
        .and(with_state(service))
        .and(with_validated_body::<UpdateInventoryRequest>())
        .and_then(update_inventory);

    list.or(get).or(history).or(update).boxed()
}

async fn list_inventory(service: Arc<InventoryService>) -> Result<impl Reply, Rejection> {
    let products = service.list().await.map_err(warp::reject::custom)?;
    Ok(response::success("Inventory fetched successfully", products))
}

async fn get_inventory(id: Uuid, service: Arc<InventoryService>) -> Result<impl Reply, Rejection> {
    let product = service.get(id).await.map_err(warp::reject::custom)?;
    Ok(response::success("Inventory item fetched successfully", product))
}

async fn stock_history(
    id: Uuid,
    _admin: AuthUser,
    service: Arc<InventoryService>,
) -> Result<impl Reply, Rejection> {
    let history = service.history(id).await.map_err(warp::reject::custom)?;
    Ok(response::success("Stock history fetched successfully", history))
}

async fn update_inventory(
    id: Uuid,
    admin: AuthUser,
    service: Arc<InventoryService>,
    body: UpdateInventoryRequest,
) -> Result<impl Reply, Rejection> {
    tracing::debug!(admin_id = %admin.user_id, product_id = %id, "inventory update");
    let product = service
        .set_quantity(id, body.quantity, body.reason)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Inventory updated successfully", product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{bearer, json_body, jwt_keys};
    use crate::db::memory::MemoryStore;
    use crate::shared::error::handlers::handle_rejection;
    use rust_decimal::Decimal;
    use warp::http::StatusCode;

    #[tokio::test]
    async fn admin_adjusts_stock_and_reads_history() {
        let store = Arc::new(MemoryStore::new());
        let keys = jwt_keys();
        let admin = store.add_user("root@shop.test", "hash", &[RoleName::Admin]);
        let user = store.add_user("u@shop.test", "hash", &[RoleName::User]);
        let product = store.add_product("Mug", Decimal::new(500, 2), 10);
        let service = Arc::new(InventoryService::new(store.clone(), store));
        let api = inventory_routes(service, keys.clone()).recover(handle_rejection);

        let res = warp::test::request()
            .method("PATCH")
            .path(&format!("/v1/inventory/{}", product.id))
            .header("authorization", bearer(&keys, &user, &[RoleName::User]))
            .json(&serde_json::json!({"quantity": 3}))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = warp::test::request()
            .method("PATCH")
            .path(&format!("/v1/inventory/{}", product.id))
            .header("authorization", bearer(&keys, &admin, &[RoleName::Admin]))
            .json(&serde_json::json!({"quantity": 3, "reason": "audit"}))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(&res)["data"]["quantity"], 3);

        let res = warp::test::request()
            .path(&format!("/v1/inventory/{}/history", product.id))
            .header("authorization", bearer(&keys, &admin, &[RoleName::Admin]))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(&res);
        assert_eq!(body["data"][0]["previousQuantity"], 10);
        assert_eq!(body["data"][0]["reason"], "audit");
    }

    #[tokio::test]
    async fn listing_is_public() {
        let store = Arc::new(MemoryStore::new());
        store.add_product("Mug", Decimal::new(500, 2), 10);
        let service = Arc::new(InventoryService::new(store.clone(), store));
        let api = inventory_routes(service, jwt_keys()).recover(handle_rejection);

        let res = warp::test::request().path("/v1/inventory").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(&res)["data"][0]["quantity"], 10);
    }
}
