use std::net::SocketAddr;
use std::sync::Arc;

use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

use super::dto::*;
use super::service::AuthService;
use crate::schema::models::LoginInfo;
use crate::shared::response;
use crate::shared::security::{AuthUser, with_auth};
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::validator::{with_state, with_validated_body};

/// Client address (first `X-Forwarded-For` hop, else the socket peer) and user agent.
fn with_login_info() -> impl Filter<Extract = (LoginInfo,), Error = Rejection> + Clone {
    warp::header::optional::<String>("x-forwarded-for")
        .and(warp::addr::remote())
        .and(warp::header::optional::<String>("user-agent"))
        .map(
            |forwarded: Option<String>, remote: Option<SocketAddr>, user_agent: Option<String>| {
                let ip = forwarded
                    .as_deref()
                    .and_then(|f| f.split(',').next())
                    .map(|ip| ip.trim().to_string())
                    .filter(|ip| !ip.is_empty())
                    .or_else(|| remote.map(|addr| addr.ip().to_string()));
                LoginInfo { ip, user_agent }
            },
        )
}

pub fn auth_routes(service: Arc<AuthService>, keys: Arc<JwtKeys>) -> BoxedFilter<(impl Reply,)> {
    let register_initiate = warp::path!("v1" / "auth" / "register" / "initiate")
        .and(warp::post())
        .and(with_state(service.clone()))
        .and(with_validated_body::<RegisterInitiateRequest>())
        .and_then(register_initiate);

    let register_confirm = warp::path!("v1" / "auth" / "register" / "confirm")
        .and(warp::post())
        .and(with_state(service.clone()))
        .and(with_validated_body::<RegisterConfirmRequest>())
        .and(with_login_info())
        .and_then(register_confirm);

    let login = warp::path!("v1" / "auth" / "login")
        .and(warp::post())
        .and(with_state(service.clone()))
        .and(with_validated_body::<LoginRequest>())
        .and(with_login_info())
        .and_then(login);

    let logout = warp::path!("v1" / "auth" / "logout")
        .and(warp::post())
        .and(with_auth(keys))
        .and(with_state(service.clone()))
        .and_then(logout);

    let refresh = warp::path!("v1" / "auth" / "token" / "refresh")
        .and(warp::post())
        .and(with_state(service.clone()))
        .and(with_validated_body::<RefreshTokenRequest>())
        .and_then(refresh);

    let forgot_initiate = warp::path!("v1" / "auth" / "forgot-password" / "initiate")
        .and(warp::post())
        .and(with_state(service.clone()))
        .and(with_validated_body::<ForgotPasswordInitiateRequest>())
        .and_then(forgot_password_initiate);

    let forgot_confirm = warp::path!("v1" / "auth" / "forgot-password" / "confirm")
        .and(warp::post())
        .and(with_state(service))
        .and(with_validated_body::<ForgotPasswordConfirmRequest>())
        .and_then(forgot_password_confirm);

    register_initiate
        .or(register_confirm)
        .or(login)
        .or(logout)
        .or(refresh)
        .or(forgot_initiate)
        .or(forgot_confirm)
        .boxed()
}

async fn register_initiate(
    service: Arc<AuthService>,
    body: RegisterInitiateRequest,
) -> Result<impl Reply, Rejection> {
    service
        .register_initiate(&body.email, &body.password)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message(
        "OTP sent to your email. Please verify to complete registration.",
    ))
}

async fn register_confirm(
    service: Arc<AuthService>,
    body: RegisterConfirmRequest,
    info: LoginInfo,
) -> Result<impl Reply, Rejection> {
    let tokens = service
        .register_confirm(&body.email, &body.otp, info)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success(
        "Registration successful.",
        TokensResponse { tokens },
    ))
}

async fn login(
    service: Arc<AuthService>,
    body: LoginRequest,
    info: LoginInfo,
) -> Result<impl Reply, Rejection> {
    let tokens = service
        .login(&body.email, &body.password, info)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success("Login successful.", TokensResponse { tokens }))
}

async fn logout(user: AuthUser, service: Arc<AuthService>) -> Result<impl Reply, Rejection> {
    service
        .logout(user.user_id)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Logged out successfully."))
}

async fn refresh(
    service: Arc<AuthService>,
    body: RefreshTokenRequest,
) -> Result<impl Reply, Rejection> {
    let tokens = service
        .refresh(&body.refresh_token)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::success(
        "Token refresh successful.",
        TokensResponse { tokens },
    ))
}

async fn forgot_password_initiate(
    service: Arc<AuthService>,
    body: ForgotPasswordInitiateRequest,
) -> Result<impl Reply, Rejection> {
    service
        .forgot_password_initiate(&body.email)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message(
        "If the email is registered, a reset link will be sent.",
    ))
}

async fn forgot_password_confirm(
    service: Arc<AuthService>,
    body: ForgotPasswordConfirmRequest,
) -> Result<impl Reply, Rejection> {
    service
        .forgot_password_confirm(&body.token, &body.new_password)
        .await
        .map_err(warp::reject::custom)?;
    Ok(response::message("Password reset successful."))
}
