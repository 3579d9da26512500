mod api;
mod db;
mod schema;
mod shared;

use std::sync::Arc;

use anyhow::Context;
use tracing::*;
use warp::Filter;

use crate::api::{Collaborators, Repositories};
use crate::shared::config::environment::Environment;
use crate::shared::utils::hash::Hasher;
use crate::shared::utils::jwt::JwtKeys;
use crate::shared::utils::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        eprintln!("⚠️  .env file not found. Continuing with system environment variables.");
    }

    let env = Environment::new().context("failed to load configuration")?;
    let _log_guard = init_logger(&env.log);

    let pool = db::connection::establish_connection(&env)
        .await
        .context("failed to connect to Postgres")?;
    info!("✅ Postgres is connected");
    db::connection::run_migrations(&pool).await?;
    db::connection::seed_roles(&pool).await?;

    let mailer = shared::mail::from_config(&env.mail).context("failed to set up the mailer")?;
    let storage =
        shared::storage::build(&env.storage).context("failed to set up media storage")?;
    info!(driver = ?env.storage.driver, "✅ Storage is ready");

    let keys = Arc::new(JwtKeys::new(&env.jwt));
    let api = api::routes(
        Repositories::postgres(pool),
        Collaborators {
            keys,
            hasher: Hasher::default(),
            mailer,
            storage,
            frontend_url: env.frontend_url.clone(),
        },
    );

    let health_route = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    // Files written by the local storage driver; empty under S3.
    let uploads = warp::path("uploads").and(warp::fs::dir(env.storage.local_path.clone()));

    let cors = warp::cors()
        .allow_origin(env.cors_origin.as_str())
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization"]);

    let routes = health_route
        .or(uploads)
        .or(api)
        .with(cors)
        .with(warp::trace::request());

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(env.bind_addr, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("❌ Failed to listen for shutdown signal: {}", err);
            }
            info!("⚠️ Shutdown signal received, terminating server...");
        })
        .context("failed to bind the HTTP listener")?;

    info!("🚀 Server running on http://{}", addr);
    server.await;
    Ok(())
}
