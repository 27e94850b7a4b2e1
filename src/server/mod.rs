//! HTTP front end.
//!
//! | Route              | Method     | Body                          |
//! |--------------------|------------|-------------------------------|
//! | `/`                | GET        | liveness message              |
//! | `/voices`          | GET        | `{"voices": [...]}`           |
//! | `/languages`       | GET        | `{"languages": [...]}`        |
//! | `/tts`             | GET, POST  | audio attachment              |
//! | `/upload-epub`     | POST       | audio attachment              |
//! | `/upload-pdf`      | POST       | audio attachment              |

pub mod error;
pub mod form;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub use state::AppState;

use crate::{config::ServerConfig, engine::SpeechEngine};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/voices", get(handlers::voices))
        .route("/languages", get(handlers::languages))
        .route("/tts", get(handlers::tts_query).post(handlers::tts))
        .route("/upload-epub", post(handlers::upload_epub))
        .route("/upload-pdf", post(handlers::upload_pdf))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.body_limit)),
        )
        .with_state(state)
}

/// CORS for the given origins, with credentials; methods and headers are
/// mirrored from the preflight request.
///
/// `*` allows every origin.  A literal wildcard cannot be sent together with
/// credentials, so the request's own origin is echoed back instead.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allow_origin = if origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins = origins
            .iter()
            .map(|o| o.trim().parse::<HeaderValue>().with_context(|| format!("invalid CORS origin '{o}'")))
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, engine: Arc<dyn SpeechEngine>) -> Result<()> {
    let state = AppState::new(engine)
        .with_chunk_size(config.chunk_size)
        .with_body_limit(config.max_upload_bytes());
    let app = router(state).layer(cors_layer(&config.cors_origins)?);

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("cannot bind {}", config.listen))?;
    info!(addr = %config.listen, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}
