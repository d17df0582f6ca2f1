//! Backend entry-point: loads settings, migrates both databases and serves
//! the REST API.

mod server;

use std::time::Duration;

use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use glucose_backend::domain::RoleId;
use glucose_backend::inbound::http::error::expose_internal_causes;
use glucose_backend::outbound::persistence::{DbPool, PoolConfig, Store, run_migrations};

use server::{AppSettings, ServerConfig, create_server, reconcile};

async fn connect(store: Store, url: String, max_size: u32) -> std::io::Result<DbPool> {
    run_migrations(store, url.clone())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    DbPool::new(PoolConfig::new(url).with_max_size(max_size))
        .await
        .map_err(|e| std::io::Error::other(format!("failed to build {store:?} pool: {e}")))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv = dotenvy::dotenv();

    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "failed to read .env");
        }
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let secret = settings
        .secret_key()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    expose_internal_causes(!settings.is_production());

    let canonical_pool = connect(
        Store::Canonical,
        settings.canonical_database().url(),
        settings.pool_max_size(),
    )
    .await?;
    let bridging_pool = connect(
        Store::Bridging,
        settings.bridging_database().url(),
        settings.pool_max_size(),
    )
    .await?;

    let config = ServerConfig::new(bind_addr, canonical_pool, bridging_pool, secret.as_bytes())
        .with_token_ttl(settings.token_ttl_secs())
        .with_static_bridging_token(settings.static_bridging_token.clone())
        .with_cookie_secure(settings.cookie_secure)
        .with_default_role(RoleId::new(settings.default_role_id()))
        .with_allowed_origins(settings.allowed_origins())
        .with_environment(settings.environment())
        .with_activity_log_path(Some(settings.activity_log_path()));

    let running = create_server(config)?;

    let reconciler = settings.reconcile_interval_secs().map(|secs| {
        reconcile::spawn(running.validation.clone(), Duration::from_secs(secs))
    });
    if reconciler.is_none() {
        info!("bridging reconciliation disabled");
    }

    info!(%bind_addr, environment = settings.environment(), "server listening");
    let result = running.server.await;

    running.health_state.mark_unhealthy();
    if let Some(handle) = reconciler {
        handle.abort();
    }
    result
}
