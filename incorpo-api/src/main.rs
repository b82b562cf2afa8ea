//! # Incorpo API Server
//!
//! Startup sequence:
//! 1. Tracing (`RUST_LOG`, `LOG_FORMAT=json` for JSON lines)
//! 2. Configuration from the environment and `.env`
//! 3. Database pool and migrations
//! 4. Default admin seed (development only)
//! 5. Optional Redis connection for rate limiting
//! 6. HTTP server with graceful shutdown
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p incorpo-api
//! ```

use incorpo_api::{
    app::{build_router, AppState},
    config::Config,
    error::set_expose_internal_errors,
    seed::seed_default_admin,
};
use incorpo_shared::{
    db::{
        migrations::{ensure_database_exists, get_migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig as PoolConfig},
    },
    redis::{client::sanitize_url, RedisClient, RedisConfig},
    storage::LocalDiskStore,
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Incorpo API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    set_expose_internal_errors(config.environment.is_development());
    tracing::info!(environment = config.environment.as_str(), "Configuration loaded");

    if config.environment.is_development() {
        ensure_database_exists(&config.database.url).await?;
    }

    let pool = create_pool(PoolConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;
    let migrations = get_migration_status(&pool).await?;
    tracing::info!(
        applied = migrations.applied_migrations,
        latest_version = ?migrations.latest_version,
        "Database schema ready"
    );

    seed_default_admin(&pool, &config).await?;

    let redis = match config.rate_limit.redis_url.as_deref() {
        Some(url) => match RedisClient::new(RedisConfig::new(url)).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(
                    url = %sanitize_url(url),
                    error = %e,
                    "Redis unavailable, rate limiting disabled"
                );
                None
            }
        },
        None => {
            tracing::info!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    tokio::fs::create_dir_all(&config.uploads.dir).await?;
    let storage = Arc::new(LocalDiskStore::new(&config.uploads.dir));

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config, storage, redis);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "incorpo_api=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
