use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use configuration::AllowList;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Rejects requests whose `Origin` is present and outside the allow-list.
///
/// Requests without an origin (same-origin, curl, server-to-server) pass.
/// A rejected request never reaches a route handler.
pub async fn origin_guard(
    State(allow_list): State<Arc<AllowList>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    match origin {
        Some(origin) if !origin.is_empty() && !allow_list.contains(&origin) => {
            Err(AppError::Authorization(origin))
        }
        _ => Ok(next.run(request).await),
    }
}

/// CORS headers for allow-listed origins. Rejection is `origin_guard`'s job.
pub fn cors_layer(allow_list: &AllowList) -> CorsLayer {
    let origins: Vec<HeaderValue> = allow_list
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring allow-list entry that is not a valid header value.");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Pass-through middleware sitting just in front of the routes.
pub async fn request_context(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::debug!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled."
    );
    response
}
