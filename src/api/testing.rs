//! Fixtures shared by service and route tests.

use std::sync::Arc;

use bytes::Bytes;
use warp::http::Response;

use crate::schema::models::{RoleName, User};
use crate::shared::config::environment::JwtConfig;
use crate::shared::utils::jwt::JwtKeys;

pub fn jwt_keys() -> Arc<JwtKeys> {
    Arc::new(JwtKeys::new(&JwtConfig {
        access_secret: "access-secret-for-tests".to_string(),
        access_expires_in_secs: 900,
        refresh_secret: "refresh-secret-for-tests".to_string(),
        refresh_expires_in_secs: 3600,
    }))
}

/// `Bearer <token>` header value for `user` holding `roles`.
pub fn bearer(keys: &JwtKeys, user: &User, roles: &[RoleName]) -> String {
    let roles = roles.iter().map(|r| r.as_str().to_string()).collect();
    let token = keys
        .generate_access_token(user.id, &user.email, roles)
        .unwrap();
    format!("Bearer {token}")
}

pub fn json_body(res: &Response<Bytes>) -> serde_json::Value {
    serde_json::from_slice(res.body()).unwrap()
}

/// Lets spawned mail tasks run before a test inspects the mailbox.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
