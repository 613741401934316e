// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP servers of the webhook.
//!
//! Two listeners are served:
//!
//! - the external-dns webhook API ([`webhook_router`]), normally bound to localhost
//!   and only reachable by the external-dns sidecar
//! - the status API ([`status_router`]) with `/healthz` and `/metrics`
//!
//! ## Webhook API
//!
//! | Method | Path | Behaviour |
//! |---|---|---|
//! | `GET` | `/` | domain filter negotiation |
//! | `GET` | `/records` | current endpoints |
//! | `POST` | `/records` | apply a change batch, `204` on success |
//! | `POST` | `/adjustendpoints` | adjust desired endpoints |
//!
//! JSON responses use the `application/external.dns.webhook+json;version=1` media type.

use crate::constants::WEBHOOK_MEDIA_TYPE;
use crate::endpoint::{Changes, Endpoint};
use crate::metrics::gather_metrics;
use crate::provider::Provider;
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Content type of the Prometheus text exposition format
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Shared state of the webhook API handlers.
#[derive(Clone)]
struct WebhookState {
    provider: Arc<dyn Provider>,
    /// Held for the duration of one `POST /records`
    apply_lock: Arc<Mutex<()>>,
}

/// Router for the external-dns webhook API.
pub fn webhook_router(provider: Arc<dyn Provider>) -> Router {
    let state = WebhookState {
        provider,
        apply_lock: Arc::new(Mutex::new(())),
    };

    Router::new()
        .route("/", get(negotiate))
        .route("/records", get(records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .with_state(state)
}

/// Router for health and metrics.
///
/// `/healthz` reports `200` once `ready` is set.
pub fn status_router(ready: Arc<AtomicBool>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(ready)
}

/// Serve `router` on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!(address = %address, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .with_context(|| format!("Server on {address} failed"))?;

    info!(address = %address, "Server stopped");
    Ok(())
}

async fn negotiate(State(state): State<WebhookState>) -> Response {
    webhook_json(StatusCode::OK, state.provider.domain_filter())
}

async fn records(State(state): State<WebhookState>) -> Response {
    match state.provider.records().await {
        Ok(endpoints) => {
            debug!(endpoints = endpoints.len(), "Returning records");
            webhook_json(StatusCode::OK, &endpoints)
        }
        Err(e) => {
            error!(error = %e, "Failed to list records");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn apply_changes(State(state): State<WebhookState>, body: Bytes) -> Response {
    let changes: Changes = match serde_json::from_slice(&body) {
        Ok(changes) => changes,
        Err(e) => {
            warn!(error = %e, "Rejecting undecodable change batch");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let _guard = state.apply_lock.lock().await;
    match state.provider.apply_changes(&changes).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to apply changes");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn adjust_endpoints(State(state): State<WebhookState>, body: Bytes) -> Response {
    let endpoints: Vec<Endpoint> = match serde_json::from_slice(&body) {
        Ok(endpoints) => endpoints,
        Err(e) => {
            warn!(error = %e, "Rejecting undecodable endpoint list");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    match state.provider.adjust_endpoints(endpoints).await {
        Ok(adjusted) => webhook_json(StatusCode::OK, &adjusted),
        Err(e) => {
            error!(error = %e, "Failed to adjust endpoints");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn healthz(State(ready): State<Arc<AtomicBool>>) -> Response {
    if ready.load(Ordering::SeqCst) {
        (StatusCode::OK, "ok").into_response()
    } else {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "webhook server is not running")
    }
}

async fn metrics() -> Response {
    match gather_metrics() {
        Ok(text) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn webhook_json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, WEBHOOK_MEDIA_TYPE)], body).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod webhook_tests;
