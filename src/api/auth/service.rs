use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::repository::AuthRepository;
use crate::schema::models::{
    LoginInfo, NewUser, PASSWORD_HISTORY_LIMIT, PendingRegistration, User,
};
use crate::shared::error::AppError;
use crate::shared::mail::{self, Mailer, templates};
use crate::shared::utils::codes::{
    generate_otp, generate_reset_token, normalize_email, username_candidate,
};
use crate::shared::utils::hash::Hasher;
use crate::shared::utils::jwt::{JwtKeys, TokenPair};

const OTP_TTL_MINUTES: i64 = 10;
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Registration, sessions and password recovery. All state lives on the
/// user row; every secret is stored as an argon2 hash.
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    hasher: Hasher,
    keys: Arc<JwtKeys>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn AuthRepository>,
        hasher: Hasher,
        keys: Arc<JwtKeys>,
        mailer: Arc<dyn Mailer>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            hasher,
            keys,
            mailer,
            frontend_url: frontend_url.into(),
        }
    }

    pub async fn register_initiate(&self, email: &str, password: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        let existing = self.repo.find_by_email(&email).await?;
        if existing.as_ref().is_some_and(|u| u.is_email_verified) {
            return Err(AppError::conflict("Email already registered"));
        }

        let otp = generate_otp();
        let otp_hash = self.hasher.hash(&otp)?;
        let otp_expiry = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);
        let password_hash = self.hasher.hash(password)?;

        match existing {
            Some(user) => {
                self.repo
                    .restart_registration(
                        user.id,
                        PendingRegistration {
                            password_hash,
                            otp_hash,
                            otp_expiry,
                        },
                    )
                    .await?;
                info!(user_id = %user.id, "registration re-initiated");
            }
            None => {
                let username = self.unique_username(&email).await?;
                let user = self
                    .repo
                    .create_pending(NewUser {
                        email: email.clone(),
                        username,
                        password_hash,
                        otp_hash,
                        otp_expiry,
                    })
                    .await?;
                info!(user_id = %user.id, "registration initiated");
            }
        }

        mail::dispatch(self.mailer.clone(), templates::otp(&email, &otp));
        Ok(())
    }

    pub async fn register_confirm(
        &self,
        email: &str,
        otp: &str,
        info: LoginInfo,
    ) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .filter(|u| !u.is_email_verified)
            .ok_or_else(|| AppError::bad_request("No pending registration"))?;

        let otp_hash = match (&user.otp_hash, user.otp_expiry) {
            (Some(hash), Some(expiry)) if expiry > Utc::now() => hash,
            _ => return Err(AppError::bad_request("OTP expired or invalid")),
        };
        if !self.hasher.verify(otp, otp_hash)? {
            return Err(AppError::bad_request("Invalid OTP"));
        }

        self.repo.mark_verified(user.id).await?;
        info!(user_id = %user.id, "email verified");
        self.start_session(&user, info).await
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        info: LoginInfo,
    ) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);
        // missing, inactive and unverified accounts look the same to the caller
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .filter(|u| u.is_active() && u.is_email_verified)
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        if !self.hasher.verify(password, &user.password_hash)? {
            self.repo.record_failed_login(user.id).await?;
            warn!(user_id = %user.id, "failed login attempt");
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let pair = self.start_session(&user, info).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.repo.set_refresh_token(user_id, None).await?;
        info!(%user_id, "user logged out");
        Ok(())
    }

    /// Rotates both tokens; the presented refresh token stops working.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self
            .keys
            .decode_refresh_token(refresh_token)
            .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .filter(User::is_active)
            .ok_or_else(|| AppError::unauthorized("Invalid user or session"))?;
        let stored = user
            .current_hashed_refresh_token
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("Invalid user or session"))?;

        if !self.hasher.verify(refresh_token, stored)? {
            warn!(%user_id, "refresh token mismatch");
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        let pair = self.issue_pair(&user).await?;
        let hash = self.hasher.hash(&pair.refresh_token)?;
        self.repo.set_refresh_token(user.id, Some(&hash)).await?;
        debug!(%user_id, "tokens rotated");
        Ok(pair)
    }

    /// Silent for unknown or inactive accounts.
    pub async fn forgot_password_initiate(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        let Some(user) = self
            .repo
            .find_by_email(&email)
            .await?
            .filter(User::is_active)
        else {
            debug!("password reset requested for unknown or inactive account");
            return Ok(());
        };

        let token = generate_reset_token();
        let hash = self.hasher.hash(&token)?;
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.repo.set_reset_token(user.id, &hash, expires).await?;

        let reset_url = format!(
            "{}/auth/reset-password/?token={token}",
            self.frontend_url.trim_end_matches('/')
        );
        mail::dispatch(
            self.mailer.clone(),
            templates::password_reset(&user.email, &reset_url),
        );
        info!(user_id = %user.id, "password reset issued");
        Ok(())
    }

    pub async fn forgot_password_confirm(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let candidates = self.repo.users_with_live_reset_token(Utc::now()).await?;
        let user = candidates
            .into_iter()
            .find(|u| {
                u.password_reset_token
                    .as_deref()
                    .is_some_and(|hash| self.hasher.verify(token, hash).unwrap_or(false))
            })
            .ok_or_else(|| AppError::bad_request("Invalid or expired token"))?;

        for previous in &user.previous_passwords {
            if self.hasher.verify(new_password, previous)? {
                return Err(AppError::bad_request("Cannot reuse previous password"));
            }
        }

        let password_hash = self.hasher.hash(new_password)?;
        let mut history = user.previous_passwords.clone();
        history.push(password_hash.clone());
        if history.len() > PASSWORD_HISTORY_LIMIT {
            history.drain(..history.len() - PASSWORD_HISTORY_LIMIT);
        }

        self.repo
            .reset_password(user.id, &password_hash, &history)
            .await?;
        info!(user_id = %user.id, "password reset completed");
        Ok(())
    }

    async fn unique_username(&self, email: &str) -> Result<String, AppError> {
        loop {
            let candidate = username_candidate(email);
            if !self.repo.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let roles = self.repo.roles_for(user.id).await?;
        let roles = roles.iter().map(|r| r.as_str().to_string()).collect();
        Ok(self.keys.generate_pair(user.id, &user.email, roles)?)
    }

    /// Issues a pair and records it as the single live session.
    async fn start_session(&self, user: &User, info: LoginInfo) -> Result<TokenPair, AppError> {
        let pair = self.issue_pair(user).await?;
        let hash = self.hasher.hash(&pair.refresh_token)?;
        self.repo.record_login(user.id, &hash, info).await?;
        Ok(pair)
    }
}
