use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::conflict_on_unique;
use crate::schema::models::{ProfileChanges, RoleName, User};
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<RoleName>, RepositoryError>;
    /// Every user that is not soft-deleted, with roles.
    async fn list_active(&self) -> Result<Vec<(User, Vec<RoleName>)>, RepositoryError>;
    async fn username_taken(&self, username: &str, except: Uuid) -> Result<bool, RepositoryError>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges)
    -> Result<User, RepositoryError>;
    /// Marks the user deleted and drops the stored refresh token.
    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// Replaces the role set.
    async fn set_roles(&self, id: Uuid, roles: &[RoleName]) -> Result<(), RepositoryError>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn fetch_roles(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<RoleName>, RepositoryError> {
    let roles = sqlx::query_scalar::<_, RoleName>(
        "SELECT r.name FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = $1
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<RoleName>, RepositoryError> {
        fetch_roles(&self.pool, user_id).await
    }

    async fn list_active(&self) -> Result<Vec<(User, Vec<RoleName>)>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE deleted_at IS NULL AND status <> 'deleted'
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let pairs = sqlx::query_as::<_, (Uuid, RoleName)>(
            "SELECT ur.user_id, r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_user: HashMap<Uuid, Vec<RoleName>> = HashMap::new();
        for (user_id, role) in pairs {
            by_user.entry(user_id).or_default().push(role);
        }

        Ok(users
            .into_iter()
            .map(|u| {
                let roles = by_user.remove(&u.id).unwrap_or_default();
                (u, roles)
            })
            .collect())
    }

    async fn username_taken(&self, username: &str, except: Uuid) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                username = COALESCE($4, username),
                dob = COALESCE($5, dob),
                phone = COALESCE($6, phone),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.username)
        .bind(changes.dob)
        .bind(changes.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Username already taken"))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET status = 'deleted', deleted_at = NOW(),
                current_hashed_refresh_token = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_roles(&self, id: Uuid, roles: &[RoleName]) -> Result<(), RepositoryError> {
        let names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name::text = ANY($2)",
        )
        .bind(id)
        .bind(&names)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
