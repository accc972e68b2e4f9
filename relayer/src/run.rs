//! Server startup: logging, chain bootstrap and the HTTP listener.

use aa_chain_eip155::chain::{Chain, Eip155ChainReference};
use aa_chain_eip155::deployment::Deployment;
use aa_relayer_local::util::SigDown;
use aa_relayer_local::{RelayerLocal, handlers};
use axum::Router;
use axum::http::Method;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors;

#[cfg(feature = "telemetry")]
use aa_relayer_local::util::Telemetry;

use crate::config::Config;

/// Initializes the relayer server.
///
/// - Loads `.env` variables.
/// - Installs logging, with OpenTelemetry export under the `telemetry` feature.
/// - Credits genesis balances and deploys the account factory as the configured deployer.
/// - Starts an Axum HTTP server with the relayer handlers.
///
/// Binds to `host` and `port` of the configuration, or the `HOST` and `PORT` env vars.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    #[cfg(feature = "telemetry")]
    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register()?;
    #[cfg(not(feature = "telemetry"))]
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let chain_reference = Eip155ChainReference::try_from(config.chain())?;
    let mut chain = Chain::new(chain_reference);
    for allocation in config.genesis() {
        chain.deal(allocation.address.into(), allocation.balance);
    }
    let deployment = Deployment::bootstrap(&mut chain, config.deployer())?;
    tracing::info!(
        chain = %config.chain(),
        factory = %deployment.factory.address(),
        account_implementation = %deployment.account_implementation,
        "Factory deployed"
    );

    let relayer = RelayerLocal::new(chain, deployment.factory, config.relayer());
    let axum_state = Arc::new(relayer);

    let http_endpoints = Router::new().merge(handlers::routes().with_state(axum_state));
    #[cfg(feature = "telemetry")]
    let http_endpoints = http_endpoints.layer(telemetry.http_tracing());
    let http_endpoints = http_endpoints.layer(
        cors::CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(cors::Any),
    );

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let sig_down = SigDown::try_new()?;
    let axum_cancellation_token = sig_down.cancellation_token();
    let axum_graceful_shutdown = async move { axum_cancellation_token.cancelled().await };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(axum_graceful_shutdown)
        .await?;
    sig_down.recv().await;

    Ok(())
}
