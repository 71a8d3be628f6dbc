/*
 * Responsibility
 * - Load Config -> build dependencies -> assemble Router
 * - Apply router-level middleware (HTTP, CORS, security headers)
 * - Start axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{AppEnv, Config};
use crate::middleware;
use crate::repos::{InMemoryUserRepo, PgUserRepo, UserStore};
use crate::services::auth::{build_auth_callbacks, build_identity_verifier};
use crate::state::AppState;

fn init_tracing(app_env: AppEnv) {
    // RUST_LOG wins when set. Otherwise debug-level auth diagnostics outside production.
    // Ex:
    // RUST_LOG=info,campus_auth=debug,tower_http=debug cargo run
    let default_filter = if app_env.debug_logging() {
        "info,campus_auth=debug,tower_http=debug"
    } else {
        "info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics via tracing; stderr may be hidden depending on how we are launched.
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default behavior, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(AppEnv::from_env());

    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting auth service in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "loaded configuration");
    if !config.identity_provider_configured() {
        tracing::warn!("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET not set; provider integration is disabled");
    }

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let users = build_user_store(config).await?;
    tracing::info!(backend = users.backend_name(), "user store ready");

    Ok(AppState::new(
        build_auth_callbacks(config, users),
        build_identity_verifier(config),
    ))
}

async fn build_user_store(config: &Config) -> Result<Arc<dyn UserStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryUserRepo::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    Ok(Arc::new(PgUserRepo::new(pool)))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    let router = middleware::http::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::security_headers::apply(router)
}
