mod api;
mod config;
mod cors;
mod error;
mod upstream;
mod validation;

use std::{sync::Arc, time::Instant};

use anyhow::Context;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::ApiState;
use crate::config::{LogFormat, ProxyConfig};
use crate::error::{
    attach_request_id_header, request_id_from_headers_or_generate, with_request_id_scope,
    ErrorCode, ProxyError,
};
use crate::upstream::ReqwestUpstream;
use crate::validation::MAX_REQUEST_BODY_BYTES;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ProxyConfig::from_env();
    init_tracing(&config);

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; /api/gemini will fail until it is configured");
    }

    let upstream = ReqwestUpstream::new(config.upstream_timeout)
        .context("failed to build upstream HTTP client")?;
    let listen_addr = config.listen_addr;
    let cors_origins = config.cors_origins.clone();
    let app = build_router(ApiState::new(config, Arc::new(upstream)), cors_origins.as_deref());

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind proxy listener on {listen_addr}"))?;

    info!(listen_addr = %listen_addr, "starting proxy server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("proxy server exited unexpectedly")
}

fn init_tracing(config: &ProxyConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn build_router(state: ApiState, cors_origins: Option<&str>) -> Router {
    apply_middleware(Router::new().route("/healthz", get(healthz)).merge(api::router(state)))
        .layer(cors::cors_layer(cors_origins))
}

fn apply_middleware(router: Router) -> Router {
    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(panic_handler))
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}

async fn panic_handler(request: Request<Body>, next: Next) -> Response {
    match tokio::spawn(async move { next.run(request).await }).await {
        Ok(response) => response,
        Err(join_error) => {
            error!(?join_error, "request handling panicked");
            ProxyError::new(ErrorCode::InternalError, "internal server error").into_response()
        }
    }
}

async fn request_context_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from_headers_or_generate(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let mut response = with_request_id_scope(request_id.clone(), next.run(request)).await;
    attach_request_id_header(&mut response, &request_id);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started_at.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}
