//! REST transport: axum router over the application services.
//!
//! Handlers call the synchronous services directly; store operations are
//! in-memory and short.

pub mod error;
pub mod links;
mod patient;
mod provider;

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{InfraError, InfraResult};

pub use error::ApiError;

pub const PATIENTS_MEDIA_TYPE: &str = "application/vnd.patients+json";
pub const PROVIDERS_MEDIA_TYPE: &str = "application/vnd.providers+json";
pub const TREATMENTS_MEDIA_TYPE: &str = "application/vnd.treatments+json";

pub type SharedState = Arc<ServiceContainer>;

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    let body_limit = state.settings.upload.max_body_bytes;
    Router::new()
        .route("/patient/:id", get(patient::get_patient))
        .route("/provider", post(provider::upload))
        .route("/provider/:id", get(provider::get_provider))
        .route("/provider/:id/treatment/:tid", get(provider::get_treatment))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(state: SharedState, bind: &str) -> InfraResult<()> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| InfraError::io(format!("bind {bind}"), e))?;
    let addr = listener
        .local_addr()
        .map_err(|e| InfraError::io("local address", e))?;
    info!("listening on http://{addr}");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_on(signal::ctrl_c()))
        .await
        .map_err(|e| InfraError::Server {
            message: e.to_string(),
        })
}

/// Resolves once `signal` fires. If the handler could not be installed the
/// server keeps running until killed.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!("cannot listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// 200 response with a vendor media type and the given extra headers.
fn vendor_json<T: Serialize>(
    media_type: &'static str,
    mut headers: HeaderMap,
    body: &T,
) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(body)?;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(media_type));
    let mut response = Response::new(Body::from(bytes));
    *response.headers_mut() = headers;
    Ok(response)
}
