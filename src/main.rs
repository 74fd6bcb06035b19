#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::sync::Arc;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::JwtKeys;
use crate::api::router;
use crate::config::Config;
use crate::service::LinkService;
use crate::storage::Memory;
use crate::storage::Postgres;
use crate::storage::Storage;

mod api;
mod clock;
mod codes;
mod config;
mod graceful_shutdown;
mod links;
mod root;
mod service;
mod storage;
#[cfg(test)]
mod tests;
mod utils;

const DEFAULT_RUST_LOG: &str = "shortlink=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let config = Config::from_env()?;
    let address = config.address;

    let app = setup_app(config).await?;

    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// Postgres is used when `DATABASE_URL` is set, links are kept in memory otherwise
///
/// # Errors
///
/// Will return `Err` if the database connection or its migrations fail
pub async fn setup_app(config: Config) -> Result<Router> {
    let config = Arc::new(config);

    let app = if let Some(database_url) = &config.database_url {
        let storage = Postgres::connect(database_url).await?;
        let service = LinkService::new(storage, config.code_length);

        create_router(service, config)
    } else {
        tracing::warn!("`DATABASE_URL` is not set, links are kept in memory and lost on restart");

        let service = LinkService::new(Memory::new(), config.code_length);

        create_router(service, config)
    };

    Ok(app)
}

/// Create the router for Shortlink
fn create_router<S: Storage>(service: LinkService<S>, config: Arc<Config>) -> Router {
    let jwt_keys = JwtKeys::new(config.jwt_secret.as_bytes());

    Router::new()
        .nest("/api", router::<S>())
        .fallback(get(root::root::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(service))
        .layer(Extension(config))
        .layer(Extension(jwt_keys))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}
