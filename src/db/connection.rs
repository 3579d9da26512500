use crate::shared::config::environment::Environment;
use crate::shared::error::RepositoryError;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

pub async fn establish_connection(env: &Environment) -> Result<PgPool, RepositoryError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&env.database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations applied");
    Ok(())
}

/// Inserts the `user` and `admin` roles when missing. Safe to run on every boot.
pub async fn seed_roles(pool: &PgPool) -> Result<(), RepositoryError> {
    for name in ["user", "admin"] {
        sqlx::query(
            "INSERT INTO roles (id, name) VALUES ($1, $2::role_name)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;
    }
    Ok(())
}
