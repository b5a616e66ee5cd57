use axum::{
    extract::{ConnectInfo, RawQuery, State},
    http::header::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::error;

use super::error::PixelError;
use super::extract::{callback_param, parse_referrer, referrer, validate_callback};
use super::ip_extractor::extract_client_ip;
use super::jsonp;
use crate::config::{CallbackConfig, ClientIpConfig};
use crate::counter::{CounterAggregator, Visit};

pub struct PixelState {
    pub aggregator: CounterAggregator,
    pub client_ip: ClientIpConfig,
    pub callback: CallbackConfig,
}

/// Count a page load and answer with the callback-wrapped counters
pub async fn count_visit(
    State(state): State<Arc<PixelState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<String, PixelError> {
    let callback = callback_param(query.as_deref());
    let callback = validate_callback(callback.as_deref(), state.callback.strict)?;
    let raw_referrer = referrer(&headers)?;

    let page = parse_referrer(&raw_referrer).inspect_err(|err| {
        error!(referrer = %raw_referrer, error = %err, "rejecting request");
    })?;

    let visit = Visit {
        site: page.site,
        path: page.path,
        visitor_id: extract_client_ip(&headers, addr.ip(), &state.client_ip).to_string(),
    };

    let snapshot = state.aggregator.record(&visit).await;

    Ok(jsonp::render(callback, &snapshot))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
