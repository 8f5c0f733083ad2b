use super::{AdapterError, PayloadVersion};
use axum::{
    http::{header, HeaderMap},
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::collections::BTreeMap;

/// The response object the function platform expects back.
///
/// REST (v1) responses carry every header value in `multiValueHeaders`.
/// HTTP API (v2) responses have no such field, so their `set-cookie` values
/// move to `cookies` instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    /// One value per header; repeated headers are comma-joined, except
    /// `set-cookie` which cannot be joined. On v1 it keeps its last value
    /// here, on v2 it is left out.
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    /// Drains a router response into the platform shape. Textual bodies are
    /// returned as-is, anything else base64-encoded.
    pub async fn from_response(
        response: Response,
        version: PayloadVersion,
    ) -> Result<Self, AdapterError> {
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| AdapterError::Body(e.to_string()))?;

        let (mut headers, mut multi_value_headers) = split_headers(&parts.headers);
        let cookies = match version {
            PayloadVersion::V1 => Vec::new(),
            PayloadVersion::V2 => {
                headers.remove(header::SET_COOKIE.as_str());
                let cookies = multi_value_headers
                    .remove(header::SET_COOKIE.as_str())
                    .unwrap_or_default();
                multi_value_headers.clear();
                cookies
            }
        };

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        let (body, is_base64_encoded) = if is_textual(content_type) {
            match String::from_utf8(bytes.to_vec()) {
                Ok(text) => (text, false),
                Err(e) => (STANDARD.encode(e.into_bytes()), true),
            }
        } else {
            (STANDARD.encode(&bytes), true)
        };

        Ok(Self {
            status_code: parts.status.as_u16(),
            headers,
            multi_value_headers,
            cookies,
            body,
            is_base64_encoded,
        })
    }
}

fn split_headers(
    headers: &HeaderMap,
) -> (BTreeMap<String, String>, BTreeMap<String, Vec<String>>) {
    let mut multi: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        multi.entry(name.as_str().to_owned()).or_default().push(value);
    }

    let single = multi
        .iter()
        .filter_map(|(name, values)| {
            let value = if name == header::SET_COOKIE.as_str() {
                values.last().cloned()
            } else {
                Some(values.join(", "))
            };
            value.map(|value| (name.clone(), value))
        })
        .collect();

    (single, multi)
}

fn is_textual(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("text/")
        || ["json", "xml", "javascript", "x-www-form-urlencoded"]
            .iter()
            .any(|kind| content_type.contains(kind))
}
