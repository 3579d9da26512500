use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::shared::utils::jwt::TokenPair;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInitiateRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "must be 8-128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterConfirmRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,

    #[validate(length(equal = 6, message = "must be 6 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordInitiateRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordConfirmRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,

    #[validate(length(min = 8, max = 128, message = "must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct TokensResponse {
    pub tokens: TokenPair,
}
