//! HTTP surface for the diagnostic flows
//!
//! Routes:
//! - `GET  /`                liveness
//! - `GET  /test`            resolve binding credentials, body = credential set
//! - `POST /cleanup`         retire the last resolved credential set
//! - `GET  /ipv4-test`       probe the IPv4 echo endpoint
//! - `GET  /ipv6-test`       probe the IPv6 echo endpoint
//! - `GET  /dual-stack-test` probe the dual-stack echo endpoint
//! - `GET  /requesturi/*`    echo the request URI and query string
//!
//! Probe routes answer 200 with a human-readable report even when the
//! outbound probe fails; reachability problems are part of the diagnostic
//! output, not server errors.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::DiagError;
use crate::probe::{endpoint_for_route, IpProbe};
use crate::resolution::{CleanupOutcome, CredentialResolver};

/// Environment variable carrying the raw binding document.
pub const BINDING_INPUT_VAR: &str = "VCAP_SERVICES";

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<CredentialResolver>,
    pub probe: Arc<IpProbe>,
    /// Offering extracted by `/test`
    pub offering: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/test", get(run_test))
        .route("/cleanup", post(run_cleanup))
        .route("/ipv4-test", get(ipv4_test))
        .route("/ipv6-test", get(ipv6_test))
        .route("/dual-stack-test", get(dual_stack_test))
        .route("/requesturi/*rest", get(echo_request_uri))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn root() -> &'static str {
    "Hello, world\n"
}

async fn run_test(State(state): State<AppState>) -> Response {
    let Ok(raw) = std::env::var(BINDING_INPUT_VAR) else {
        return (
            StatusCode::BAD_REQUEST,
            format!("{BINDING_INPUT_VAR} environment variable not set\n"),
        )
            .into_response();
    };

    match state.resolver.resolve(&raw, &state.offering).await {
        Ok(credentials) => (StatusCode::OK, Json(Value::Object(credentials))).into_response(),
        Err(err) => {
            tracing::error!(offering = %state.offering, error = %err, "credential resolution failed");
            error_response(&err)
        }
    }
}

async fn run_cleanup(State(state): State<AppState>) -> Response {
    match state.resolver.cleanup().await {
        Ok(CleanupOutcome::Skipped) => {
            tracing::debug!("cleanup skipped, nothing resolved");
            StatusCode::OK.into_response()
        }
        Ok(CleanupOutcome::Deleted { name }) => {
            tracing::info!(credential = %name, "cleanup deleted credential");
            StatusCode::OK.into_response()
        }
        Err(err) => {
            // Reported to the caller, never fatal to the process.
            tracing::error!(error = %err, "cleanup failed");
            error_response(&err)
        }
    }
}

async fn ipv4_test(State(state): State<AppState>) -> Response {
    probe_route(&state, "/ipv4-test").await
}

async fn ipv6_test(State(state): State<AppState>) -> Response {
    probe_route(&state, "/ipv6-test").await
}

async fn dual_stack_test(State(state): State<AppState>) -> Response {
    probe_route(&state, "/dual-stack-test").await
}

async fn probe_route(state: &AppState, route: &str) -> Response {
    let Some(endpoint) = endpoint_for_route(route) else {
        // Routes and the endpoint table are both fixed; a miss is a bug.
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("no probe endpoint for route {route}\n"),
        )
            .into_response();
    };
    let report = state.probe.probe(endpoint.host, endpoint.label).await;
    (StatusCode::OK, format!("{report}\n")).into_response()
}

async fn echo_request_uri(uri: Uri) -> String {
    format!(
        "Request URI is [{}]\nQuery String is [{}]\n",
        uri,
        uri.query().unwrap_or("")
    )
}

fn error_response(err: &DiagError) -> Response {
    let mut body = format!("{err}\n");
    if let Some(hint) = err.hint() {
        body.push_str(hint);
        body.push('\n');
    }
    (status_for(err), body).into_response()
}

fn status_for(err: &DiagError) -> StatusCode {
    match err {
        DiagError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        DiagError::InterpolationUnavailable(_)
        | DiagError::InterpolationRejected(_)
        | DiagError::DeletionFailed { .. }
        | DiagError::ProbeTransport { .. } => StatusCode::BAD_GATEWAY,
        DiagError::OfferingNotFound(_)
        | DiagError::NoBindingInstances(_)
        | DiagError::CredentialsFieldMissing(_) => StatusCode::NOT_FOUND,
        DiagError::ReferenceFieldMissing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
