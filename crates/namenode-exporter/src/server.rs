//! HTTP surface of the exporter.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use namenode_jmx::{BeanExtractor, JmxClient, NAMESPACE};
use namenode_monitor::MetricsRegistry;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

use crate::config::ExporterConfig;
use crate::error::ExporterError;

/// State shared by every request handler.
pub struct AppState {
    pub config: ExporterConfig,
    pub extractor: BeanExtractor,
}

impl AppState {
    /// Validate `config`, declare the NameNode gauges, and build the upstream client.
    pub fn new(config: ExporterConfig) -> Result<Self, ExporterError> {
        config.validate()?;
        let registry = Arc::new(MetricsRegistry::with_namespace(NAMESPACE));
        let client = JmxClient::new(config.scrape_timeout)?;
        let extractor = BeanExtractor::new(registry, client)?;
        Ok(Self { config, extractor })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let telemetry_path = state.config.telemetry_path.clone();
    Router::new()
        .route("/", get(index))
        .route(&telemetry_path, get(metrics))
        .with_state(state)
}

/// One scrape: refresh from the NameNode, then render whatever the registry holds.
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    match state.extractor.refresh(&state.config.jmx_url).await {
        Ok(report) => tracing::debug!(
            beans = report.beans_seen,
            updated = report.fields_updated,
            skipped = report.fields_skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape cycle complete"
        ),
        Err(e) => tracing::error!(
            url = %state.config.jmx_url,
            error = %e,
            "NameNode scrape failed, serving last known values"
        ),
    }

    match state.extractor.render().await {
        Ok(body) => (
            [(header::CONTENT_TYPE, state.extractor.registry().content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>NameNode Exporter</title></head>
<body>
<h1>NameNode Exporter</h1>
<p><a href="{path}">Metrics</a></p>
</body>
</html>"#,
        path = state.config.telemetry_path
    ))
}

/// Bind the configured address and serve until CTRL+C or SIGTERM.
pub async fn serve(state: Arc<AppState>) -> Result<(), ExporterError> {
    let addr = state.config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(
        address = %addr,
        path = %state.config.telemetry_path,
        upstream = %state.config.jmx_url,
        "Starting NameNode exporter"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(ExporterError::Serve)?;

    tracing::info!("NameNode exporter stopped");
    Ok(())
}

/// Wait for a shutdown signal (CTRL+C or SIGTERM).
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received CTRL+C"); }
        _ = terminate => { tracing::info!("Received SIGTERM"); }
    }
}
