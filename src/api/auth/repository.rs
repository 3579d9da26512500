use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::users::repository::fetch_roles;
use crate::db::conflict_on_unique;
use crate::schema::models::{LoginInfo, NewUser, PendingRegistration, RoleName, User};
use crate::shared::error::RepositoryError;

/// Credential and session state kept on the user row.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError>;
    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<RoleName>, RepositoryError>;

    /// Inserts an unverified user; the password hash seeds the history.
    async fn create_pending(&self, user: NewUser) -> Result<User, RepositoryError>;
    /// New password and OTP for an unverified user re-running signup.
    async fn restart_registration(
        &self,
        id: Uuid,
        pending: PendingRegistration,
    ) -> Result<(), RepositoryError>;
    /// Grants the `user` role, marks the email verified and clears the OTP.
    async fn mark_verified(&self, id: Uuid) -> Result<(), RepositoryError>;

    async fn record_failed_login(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// Stores the refresh hash, resets the failure counter and stamps login metadata.
    async fn record_login(
        &self,
        id: Uuid,
        refresh_hash: &str,
        info: LoginInfo,
    ) -> Result<(), RepositoryError>;
    async fn set_refresh_token(&self, id: Uuid, hash: Option<&str>)
    -> Result<(), RepositoryError>;

    async fn set_reset_token(
        &self,
        id: Uuid,
        hash: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    async fn users_with_live_reset_token(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError>;
    /// Writes the new hash and history and consumes the reset token.
    async fn reset_password(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> Result<(), RepositoryError>;
}

pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthRepository for PgAuthRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<RoleName>, RepositoryError> {
        fetch_roles(&self.pool, user_id).await
    }

    async fn create_pending(&self, user: NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (
                id, email, username, password_hash, otp_hash, otp_expiry,
                previous_passwords, is_email_verified, status
             )
             VALUES ($1, $2, $3, $4, $5, $6, ARRAY[$4], FALSE, 'active')
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.otp_hash)
        .bind(user.otp_expiry)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already registered"))
    }

    async fn restart_registration(
        &self,
        id: Uuid,
        pending: PendingRegistration,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET
                password_hash = $2,
                previous_passwords = ARRAY[$2],
                otp_hash = $3,
                otp_expiry = $4,
                updated_at = NOW()
             WHERE id = $1 AND is_email_verified = FALSE",
        )
        .bind(id)
        .bind(&pending.password_hash)
        .bind(&pending.otp_hash)
        .bind(pending.otp_expiry)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = 'user'
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET
                is_email_verified = TRUE,
                otp_hash = NULL,
                otp_expiry = NULL,
                status = 'active',
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_failed_login(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = failed_login_attempts + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_login(
        &self,
        id: Uuid,
        refresh_hash: &str,
        info: LoginInfo,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET
                current_hashed_refresh_token = $2,
                failed_login_attempts = 0,
                last_login = NOW(),
                login_ip = $3,
                login_user_agent = $4,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(refresh_hash)
        .bind(info.ip)
        .bind(info.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        hash: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET current_hashed_refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        hash: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_expires = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .bind(expires)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn users_with_live_reset_token(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE password_reset_token IS NOT NULL AND password_reset_expires > $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn reset_password(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET
                password_hash = $2,
                previous_passwords = $3,
                password_reset_token = NULL,
                password_reset_expires = NULL,
                last_password_change = NOW(),
                failed_login_attempts = 0,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(history)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
