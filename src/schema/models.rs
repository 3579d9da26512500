use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::status::SoftDeletable;

/// Number of previous password hashes kept for reuse checks.
pub const PASSWORD_HISTORY_LIMIT: usize = 5;

// --------------------------------
// Roles (Postgres enum type)
// --------------------------------
#[derive(sqlx::Type, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "role_name", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    User,
    Admin,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::User => "user",
            RoleName::Admin => "admin",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(RoleName::User),
            "admin" => Ok(RoleName::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: RoleName,
    pub created_at: DateTime<Utc>,
}

// --------------------------------
// USERS
// --------------------------------
#[derive(sqlx::Type, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
    Deleted,
}

/// Full user row. Holds hashes and one-time secrets, so it is never
/// serialized; responses go through [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub phone: Option<String>,
    pub is_email_verified: bool,
    pub otp_hash: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
    pub current_hashed_refresh_token: Option<String>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub previous_passwords: Vec<String>,
    pub failed_login_attempts: i32,
    pub status: UserStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub last_password_change: Option<DateTime<Utc>>,
    pub login_ip: Option<String>,
    pub login_user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active && self.deleted_at.is_none()
    }
}

impl SoftDeletable for User {
    fn is_deleted(&self) -> bool {
        self.status == UserStatus::Deleted || self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub otp_hash: String,
    pub otp_expiry: DateTime<Utc>,
}

/// Registration state written when an unverified account re-initiates signup.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub password_hash: String,
    pub otp_hash: String,
    pub otp_expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub dob: Option<NaiveDate>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoginInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub phone: Option<String>,
    pub is_email_verified: bool,
    pub status: UserStatus,
    pub roles: Vec<RoleName>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user: User, roles: Vec<RoleName>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            dob: user.dob,
            phone: user.phone,
            is_email_verified: user.is_email_verified,
            status: user.status,
            roles,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// --------------------------------
// ADDRESSES
// --------------------------------
#[derive(sqlx::Type, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "address_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Shipping,
    Billing,
    Home,
    Work,
    Other,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub street: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "type")]
    pub address_type: AddressType,
    pub is_default: bool,
    pub delivery_instructions: Option<String>,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for Address {
    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub street: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address_type: AddressType,
    pub is_default: bool,
    pub delivery_instructions: Option<String>,
    pub label: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct AddressChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address_type: Option<AddressType>,
    pub is_default: Option<bool>,
    pub delivery_instructions: Option<String>,
    pub label: Option<String>,
}
