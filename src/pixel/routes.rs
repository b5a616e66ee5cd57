use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::error;

use super::error::PixelError;
use super::handlers::{count_visit, health_check, PixelState};
use crate::config::{CallbackConfig, ClientIpConfig};
use crate::counter::CounterAggregator;

/// Router for the embeddable counter endpoint.
///
/// The handler reads the peer address, so serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_pixel_router(
    aggregator: CounterAggregator,
    client_ip: ClientIpConfig,
    callback: CallbackConfig,
) -> Router {
    let state = Arc::new(PixelState {
        aggregator,
        client_ip,
        callback,
    });

    // Embedded on third-party pages, so any origin may call it
    let cors_layer = CorsLayer::permissive();

    Router::new()
        .route("/", get(count_visit))
        .route("/health", get(health_check))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer)
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "request handler panicked");

    PixelError::Internal.into_response()
}
