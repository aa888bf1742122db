use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
};
use gateway::{GatewayService, upstream::GenerationBackend};
use http::{Method, header::CONTENT_TYPE};
use shared::error::GatewayError;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::{AllowedOrigins, RelayConfig};

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StartAxumServerParams {
    pub config: RelayConfig,
    pub backend: Arc<dyn GenerationBackend>,
    pub system_shutdown_signal_rx: tokio::sync::broadcast::Receiver<()>,
}

/// Gateway routes wrapped in the body ceiling, panic boundary, CORS policy and tracing.
pub fn build_app(config: &RelayConfig, backend: Arc<dyn GenerationBackend>) -> Router {
    let service = Arc::new(GatewayService::new(backend, config.expose_error_details));
    let (router, _) = gateway::create_router().split_for_parts();

    router
        .with_state(service)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    match origins {
        AllowedOrigins::Any => CorsLayer::permissive(),
        AllowedOrigins::List(origins) => CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins.iter().cloned()))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]),
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let panic_message = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!(panic = panic_message, "Request handler panicked");

    GatewayError::internal(None).into_response()
}

/// Resolves `host` as an IP literal (v4 or v6) or a host name, taking the first address.
async fn resolve_listen_addr(host: &str, port: u16) -> Result<SocketAddr, anyhow::Error> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Invalid listen address {host}:{port}"))?
        .next()
        .with_context(|| format!("Listen host {host} resolved to no address"))
}

/// Starts the Axum server
pub async fn start_axum_server(
    params: StartAxumServerParams,
) -> Result<
    (
        impl Future<Output = Result<(), std::io::Error>>,
        axum_server::Handle,
        SocketAddr,
    ),
    anyhow::Error,
> {
    let mut system_shutdown_signal_rx = params.system_shutdown_signal_rx;
    let addr = resolve_listen_addr(&params.config.host, params.config.port).await?;

    info!("Starting server on {}", addr);

    let handle = axum_server::Handle::new();
    let router = build_app(&params.config, params.backend);

    info!(
        allowed_origins = ?params.config.allowed_origins,
        body_limit_bytes = params.config.body_limit_bytes,
        "Router initiated"
    );

    let server_fut = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(router.into_make_service());

    let handle_clone = handle.clone();

    tokio::spawn(async move {
        let _ = system_shutdown_signal_rx.recv().await;

        info!("Shutting down axum server, waiting for in-flight requests to complete...");

        // Stops accepting new connections, waits for in-flight requests
        handle_clone.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
    });

    Ok((server_fut, handle, addr))
}
