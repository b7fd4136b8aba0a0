//! Server initialization and request handling.
//!
//! - Loads `.env` values and the JSON configuration.
//! - Initializes `tracing` with an env-filter subscriber.
//! - Constructs the facilitator client, payment middleware, and Hive vendor.
//! - Starts an Axum HTTP server with CORS and graceful shutdown on
//!   SIGTERM/SIGINT.

use axum::Router;
use axum::http::Method;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use x402_axum::X402Middleware;
use x402_vendor_hive::{HiveClient, HiveDeployer};

use crate::config::Config;
use crate::handlers;
use crate::service::Services;

/// Initializes and runs the function gateway server.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    if !config.hive().enabled {
        return Err("hive.enabled must be true: no other deployment vendor is configured".into());
    }
    let hive_client = HiveClient::try_new(config.hive())?;
    let services = Arc::new(Services::new(HiveDeployer::new(hive_client)));
    tracing::info!(account = %config.hive().account, "hive deployer initialized");

    let x402 = if config.x402().enabled {
        let mut middleware = X402Middleware::try_new(config.x402().clone())?;
        if let Some(base_url) = config.base_url() {
            middleware = middleware.with_base_url(base_url.clone());
        }
        tracing::info!(
            scheme = %config.x402().scheme,
            network = %config.x402().network,
            asset = %config.x402().asset,
            decimals = config.x402().asset_decimals,
            pay_to = ?config.x402().default_pay_to,
            facilitator = ?config.x402().facilitator_base_url,
            "x402 payment gate enabled"
        );
        Some(middleware)
    } else {
        tracing::warn!("x402 payment gate disabled; paid routes are served unpaid");
        None
    };

    let app: Router = handlers::routes(services, x402)
        .layer(CatchPanicLayer::custom(handlers::system_error_response))
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {addr}: {e}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on SIGTERM or Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
