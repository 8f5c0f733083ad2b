use crate::{error::AppError, AppState};
use axum::{
    extract::State,
    http::{Method, Uri},
    Json,
};
use chrono::{SecondsFormat, Utc};
use database::Connector;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: &'static str,
    pub mongodb_status: &'static str,
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub mongodb_connected: bool,
    pub time: String,
}

/// # GET /
/// Service banner with the database status. Never touches the database.
pub async fn root<C: Connector>(State(state): State<AppState<C>>) -> Json<StatusResponse> {
    let mongodb_status = if state.db.is_ready() {
        "connected"
    } else {
        "disconnected"
    };
    Json(StatusResponse {
        message: "Satta Matka API is running!",
        mongodb_status,
        time: now_iso8601(),
    })
}

/// # GET /api/health
/// Always answers 200; `mongodb_connected` reports readiness without
/// attempting a connection.
pub async fn health<C: Connector>(State(state): State<AppState<C>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        mongodb_connected: state.db.is_ready(),
        time: now_iso8601(),
    })
}

pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Cannot {} {}", method, uri.path()))
}

/// UTC timestamp with millisecond precision and a `Z` suffix.
fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
