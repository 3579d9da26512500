use std::sync::Arc;

use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::{CreateProductRequest, UpdateProductRequest};
use super::service::ProductService;
use crate::schema::models::RoleName;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_role};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

pub fn product_routes(
    service: Arc<ProductService>,
    keys: Arc<JwtKeys>,
) -> BoxedFilter<(impl Reply,)> {
    let list = warp::path!("subcategories" / Uuid / "products")
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(list_products);

    let get = warp::path!("subcategories" / Uuid / "products" / Uuid)
        .and(warp::get())
        .and(with_state(service.clone()))
        .and_then(get_product);

    let create = warp::path!("subcategories" / Uuid / "products")
        .and(warp::post())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<CreateProductRequest>())
        .and_then(create_product);

    let update = warp::path!("subcategories" / Uuid / "products" / Uuid)
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and(with_validated_body::<UpdateProductRequest>())
        .and_then(update_product);

    let delete = warp::path!("subcategories" / Uuid / "products" / Uuid)
        .and(warp::delete())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(delete_product);

    let deactivate = warp::path!("subcategories" / Uuid / "products" / Uuid / "deactivate")
        .and(warp::patch())
        .and(with_role(keys.clone(), RoleName::Admin))
        .and(with_state(service.clone()))
        .and_then(deactivate_product);

    let activate = warp::path!("subcategories" / Uuid / "products" / Uuid / "activate")
        .and(warp::patch())
        .and(with_role(keys, RoleName::Admin))
        .and(with_state(service))
        .and_then(activate_product);

    list.or(get)
        .or(create)
        .or(update)
        .or(delete)
        .or(deactivate)
        .or(activate)
        .boxed()
}

async fn list_products(
    subcategory_id: Uuid,
    service: Arc<ProductService>,
) -> Result<impl Reply, Rejection> {
    let products = service
        .list(subcategory_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Products fetched successfully", products))
}

async fn get_product(
    subcategory_id: Uuid,
    id: Uuid,
    service: Arc<ProductService>,
) -> Result<impl Reply, Rejection> {
    let product = service
        .get(subcategory_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Product fetched successfully", product))
}

async fn create_product(
    subcategory_id: Uuid,
    admin: AuthUser,
    service: Arc<ProductService>,
    body: CreateProductRequest,
) -> Result<impl Reply, Rejection> {
    tracing::debug!(admin_id = %admin.user_id, %subcategory_id, "creating product");
    let product = service
        .create(subcategory_id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::created("Product created successfully", product))
}

async fn update_product(
    subcategory_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<ProductService>,
    body: UpdateProductRequest,
) -> Result<impl Reply, Rejection> {
    let product = service
        .update(subcategory_id, id, body.into())
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Product updated successfully", product))
}

async fn delete_product(
    subcategory_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<ProductService>,
) -> Result<impl Reply, Rejection> {
    service
        .delete(subcategory_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Product deleted successfully"))
}

async fn deactivate_product(
    subcategory_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<ProductService>,
) -> Result<impl Reply, Rejection> {
    let product = service
        .deactivate(subcategory_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Product deactivated successfully", product))
}

async fn activate_product(
    subcategory_id: Uuid,
    id: Uuid,
    _admin: AuthUser,
    service: Arc<ProductService>,
) -> Result<impl Reply, Rejection> {
    let product = service
        .activate(subcategory_id, id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Product activated successfully", product))
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
    async fn admin_creates_product_with_string_price() {
        let store = Arc::new(MemoryStore::new());
        let keys = jwt_keys();
        let admin = store.add_user("root@shop.test", "hash", &[RoleName::Admin]);
        let category = store.add_category("Electronics");
        let subcategory = store.add_subcategory(category.id, "Phones");
        let service = Arc::new(ProductService::new(store.clone(), store.clone(), store));
        let api = product_routes(service, keys.clone()).recover(handle_rejection);

        let res = warp::test::request()
            .method("POST")
            .path(&format!("/subcategories/{}/products", subcategory.id))
            .header("authorization", bearer(&keys, &admin, &[RoleName::Admin]))
            .json(&serde_json::json!({"name": "Pixel", "price": "499.00", "quantity": 3}))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(&res);
        assert_eq!(body["data"]["price"], "499.00");
        assert_eq!(body["data"]["category"]["name"], "Electronics");
        assert_eq!(body["data"]["subcategory"]["name"], "Phones");
    }

    #[tokio::test]
    async fn negative_price_fails_validation() {
        let store = Arc::new(MemoryStore::new());
        let keys = jwt_keys();
        let admin = store.add_user("root@shop.test", "hash", &[RoleName::Admin]);
        let product = store.add_product("Pixel", Decimal::new(49900, 2), 3);
        let service = Arc::new(ProductService::new(store.clone(), store.clone(), store));
        let api = product_routes(service, keys.clone()).recover(handle_rejection);

        let res = warp::test::request()
            .method("PATCH")
            .path(&format!(
                "/subcategories/{}/products/{}",
                product.subcategory_id, product.id
            ))
            .header("authorization", bearer(&keys, &admin, &[RoleName::Admin]))
            .json(&serde_json::json!({"price": -5}))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(
            json_body(&res)["message"]
                .as_str()
                .unwrap()
                .contains("Price must be non-negative")
        );
    }

    #[tokio::test]
    async fn public_listing_needs_no_token() {
        let store = Arc::new(MemoryStore::new());
        let product = store.add_product("Pixel", Decimal::new(49900, 2), 3);
        let service = Arc::new(ProductService::new(store.clone(), store.clone(), store));
        let api = product_routes(service, jwt_keys()).recover(handle_rejection);

        let res = warp::test::request()
            .path(&format!("/subcategories/{}/products", product.subcategory_id))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(&res)["data"].as_array().unwrap().len(), 1);
    }
}
