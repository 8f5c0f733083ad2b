//! Per-invocation execution.
//!
//! The platform hands the process one HTTP trigger event at a time. Each event
//! is normalized into a [`RequestEnvelope`], run through the same router the
//! server mode uses, and the response is translated back into the shape the
//! platform expects. The process, and with it the database session, may be
//! reused for later events.

pub mod event;
pub mod response;
pub mod runtime;

pub use event::{normalize, EnvelopeBody, GatewayEvent, PayloadVersion, RequestEnvelope};
pub use response::GatewayResponse;
pub use runtime::{Invocation, RuntimeClient};

use crate::{build_app, AppState, RouteGroups, HEALTH_PATH, ROOT_PATH};
use axum::Router;
use configuration::Settings;
use database::{ConnectionError, ConnectionManager, Connector};
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceExt;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Failed to build the request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("Failed to read the response body: {0}")]
    Body(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Runtime API error: {0}")]
    Runtime(String),
    #[error("Runtime API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AdapterError {
    /// Classification reported to the platform alongside the message.
    pub fn error_type(&self) -> &'static str {
        match self {
            AdapterError::InvalidEvent(_) | AdapterError::Json(_) => "InvalidEvent",
            AdapterError::Connection(_) => "DatabaseConnectionError",
            AdapterError::Request(_) | AdapterError::Body(_) => "RequestError",
            AdapterError::Runtime(_) | AdapterError::Http(_) => "RuntimeError",
        }
    }
}

/// Runs trigger events through the application router.
pub struct Adapter<C: Connector> {
    router: Router,
    manager: Arc<ConnectionManager<C>>,
}

impl<C: Connector> Adapter<C> {
    pub fn new(
        settings: &Settings,
        manager: Arc<ConnectionManager<C>>,
        groups: RouteGroups<C>,
    ) -> Self {
        let router = build_app(settings, AppState::new(manager.clone()), groups);
        Self { router, manager }
    }

    /// Handles one event: normalize, make sure the database is connected,
    /// dispatch, translate.
    ///
    /// A connection failure fails the invocation, except on the status
    /// routes, which answer with the readiness they observe. HTTP-level
    /// failures, such as a rejected origin, are ordinary responses.
    pub async fn invoke(&self, event: GatewayEvent) -> Result<GatewayResponse, AdapterError> {
        let envelope = normalize(event)?;
        if let Err(e) = self.manager.ensure_connected().await {
            if !is_status_path(&envelope.path) {
                return Err(e.into());
            }
            tracing::warn!(path = %envelope.path, error = %e, "Answering status route without a database.");
        }

        let version = envelope.version;
        let request = envelope.into_request()?;
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        GatewayResponse::from_response(response, version).await
    }
}

fn is_status_path(path: &str) -> bool {
    path == ROOT_PATH || path == HEALTH_PATH
}

/// Serves trigger events from the platform's invocation API until the API
/// itself becomes unreachable.
pub async fn run_adapter<C: Connector>(
    settings: &Settings,
    manager: Arc<ConnectionManager<C>>,
    groups: RouteGroups<C>,
) -> anyhow::Result<()> {
    let runtime_api = settings
        .aws_lambda_runtime_api
        .as_deref()
        .filter(|api| !api.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("AWS_LAMBDA_RUNTIME_API must be set in adapter mode"))?;
    let client = RuntimeClient::new(runtime_api)?;

    // Start the handshake during cold start. A failure is not fatal here; it
    // fails the invocations that need the database instead.
    {
        let manager = manager.clone();
        tokio::spawn(async move {
            let _ = manager.ensure_connected().await;
        });
    }

    let adapter = Adapter::new(settings, manager, groups);
    tracing::info!(runtime_api, "Adapter ready for invocations.");

    loop {
        let Invocation {
            request_id,
            payload,
        } = client.next_invocation().await?;

        let outcome = match serde_json::from_slice::<GatewayEvent>(&payload) {
            Ok(event) => adapter.invoke(event).await,
            Err(e) => Err(AdapterError::InvalidEvent(e.to_string())),
        };

        match outcome {
            Ok(response) => {
                tracing::debug!(%request_id, status = response.status_code, "Invocation handled.");
                client.respond(&request_id, &response).await?;
            }
            Err(e) => {
                tracing::error!(%request_id, error = %e, "Invocation failed.");
                client.report_error(&request_id, &e).await?;
            }
        }
    }
}
