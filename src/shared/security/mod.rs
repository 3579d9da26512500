use std::sync::Arc;

use uuid::Uuid;
use warp::{Filter, Rejection};

use crate::schema::models::RoleName;
use crate::shared::error::AppError;
use crate::shared::utils::jwt::JwtKeys;

/// Caller identity decoded from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<RoleName>,
}

impl AuthUser {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(RoleName::Admin)
    }
}

/// Requires `Authorization: Bearer <accessToken>`.
pub fn with_auth(keys: Arc<JwtKeys>) -> impl Filter<Extract = (AuthUser,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move { authenticate(&keys, header.as_deref()).map_err(warp::reject::custom) }
    })
}

/// Authenticated caller whose token carries `role`; Forbidden otherwise.
pub fn with_role(
    keys: Arc<JwtKeys>,
    role: RoleName,
) -> impl Filter<Extract = (AuthUser,), Error = Rejection> + Clone {
    with_auth(keys).and_then(move |user: AuthUser| async move {
        if user.has_role(role) {
            Ok(user)
        } else {
            tracing::debug!(user_id = %user.user_id, required = %role, "role check failed");
            Err(warp::reject::custom(AppError::forbidden(
                "You do not have permission to perform this action",
            )))
        }
    })
}

fn authenticate(keys: &JwtKeys, header: Option<&str>) -> Result<AuthUser, AppError> {
    let header = header.ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header"))?;

    let claims = keys.decode_access_token(token)?;
    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| AppError::unauthorized("invalid token"))?;
    // unknown role names are ignored rather than rejected
    let roles = claims.roles.iter().filter_map(|r| r.parse().ok()).collect();

    Ok(AuthUser {
        user_id,
        email: claims.email,
        roles,
    })
}
