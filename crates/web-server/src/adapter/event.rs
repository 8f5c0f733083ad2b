use super::AdapterError;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// An HTTP trigger event as delivered by the function platform.
///
/// Covers both the REST (v1) and HTTP API (v2) payload shapes; every field is
/// optional so either deserializes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    /// `"2.0"` on HTTP API events, `"1.0"` or absent on REST events.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub raw_path: Option<String>,
    #[serde(default)]
    pub raw_query_string: Option<String>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub multi_value_query_string_parameters: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub cookies: Option<Vec<String>>,
    /// A string for proxied HTTP bodies, but direct invocations may carry JSON.
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub request_context: Option<RequestContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub http: Option<HttpContext>,
}

/// The v2 location of method and path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpContext {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl GatewayEvent {
    fn method(&self) -> &str {
        self.http_method
            .as_deref()
            .or_else(|| self.http_context().and_then(|http| http.method.as_deref()))
            .unwrap_or("GET")
    }

    fn request_path(&self) -> String {
        let path = self
            .raw_path
            .as_deref()
            .or(self.path.as_deref())
            .or_else(|| self.http_context().and_then(|http| http.path.as_deref()))
            .unwrap_or("/");
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        }
    }

    fn query(&self) -> Option<String> {
        if let Some(raw) = self.raw_query_string.as_deref().filter(|q| !q.is_empty()) {
            return Some(raw.to_string());
        }

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        if let Some(params) = &self.multi_value_query_string_parameters {
            for (key, values) in params {
                for value in values {
                    serializer.append_pair(key, value);
                    any = true;
                }
            }
        } else if let Some(params) = &self.query_string_parameters {
            for (key, value) in params {
                serializer.append_pair(key, value);
                any = true;
            }
        }
        any.then(|| serializer.finish())
    }

    /// HTTP API events are recognised by their version tag or, failing that,
    /// by the `requestContext.http` block only they carry.
    pub fn payload_version(&self) -> PayloadVersion {
        match self.version.as_deref() {
            Some(version) if version.starts_with('2') => PayloadVersion::V2,
            Some(_) => PayloadVersion::V1,
            None if self.http_context().is_some() => PayloadVersion::V2,
            None => PayloadVersion::V1,
        }
    }

    fn http_context(&self) -> Option<&HttpContext> {
        self.request_context.as_ref().and_then(|ctx| ctx.http.as_ref())
    }
}

/// Which trigger-event format the platform used. The response must be
/// shaped for the same format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadVersion {
    /// REST API events: `multiValueHeaders` carries repeated headers.
    #[default]
    V1,
    /// HTTP API events: cookies travel in a dedicated `cookies` array.
    V2,
}

/// Request body after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeBody {
    Empty,
    /// The payload parsed as JSON.
    Structured(Value),
    /// Text that is not JSON, passed through untouched.
    Raw(String),
    /// Decoded base64 payload that is not valid UTF-8.
    Binary(Vec<u8>),
}

/// Transport-independent request handed to the application router.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub version: PayloadVersion,
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub source_origin: Option<String>,
    pub body: EnvelopeBody,
}

/// Translates a trigger event into a [`RequestEnvelope`].
///
/// Body contract: a string body is parsed as JSON and falls back to the raw
/// text when it does not parse; a JSON body stays structured; base64 bodies
/// are decoded first. Only an unusable method or base64 payload fails.
pub fn normalize(event: GatewayEvent) -> Result<RequestEnvelope, AdapterError> {
    let method = Method::from_bytes(event.method().to_ascii_uppercase().as_bytes())
        .map_err(|_| AdapterError::InvalidEvent(format!("invalid method {:?}", event.method())))?;
    let version = event.payload_version();
    let path = event.request_path();
    let query = event.query();
    let headers = collect_headers(&event);
    let source_origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = normalize_body(event.body, event.is_base64_encoded)?;

    Ok(RequestEnvelope {
        version,
        method,
        path,
        query,
        headers,
        source_origin,
        body,
    })
}

pub fn normalize_body(body: Option<Value>, is_base64_encoded: bool) -> Result<EnvelopeBody, AdapterError> {
    match body {
        None => Ok(EnvelopeBody::Empty),
        Some(Value::String(text)) if text.is_empty() => Ok(EnvelopeBody::Empty),
        Some(Value::String(encoded)) if is_base64_encoded => {
            let bytes = STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| AdapterError::InvalidEvent(format!("body is not valid base64: {e}")))?;
            match String::from_utf8(bytes) {
                Ok(text) => Ok(parse_text(text)),
                Err(e) => Ok(EnvelopeBody::Binary(e.into_bytes())),
            }
        }
        Some(Value::String(text)) => Ok(parse_text(text)),
        Some(value) => Ok(EnvelopeBody::Structured(value)),
    }
}

fn parse_text(text: String) -> EnvelopeBody {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => EnvelopeBody::Structured(value),
        Err(_) => EnvelopeBody::Raw(text),
    }
}

fn collect_headers(event: &GatewayEvent) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let pairs: Vec<(&str, &str)> = match (&event.multi_value_headers, &event.headers) {
        (Some(multi), _) if !multi.is_empty() => multi
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
            .collect(),
        (_, Some(single)) => single.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect(),
        _ => Vec::new(),
    };

    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping malformed header from trigger event."),
        }
    }

    if let Some(cookies) = event.cookies.as_ref().filter(|c| !c.is_empty()) {
        if let Ok(value) = HeaderValue::from_str(&cookies.join("; ")) {
            headers.insert(header::COOKIE, value);
        }
    }

    headers
}

impl RequestEnvelope {
    /// Builds the HTTP request the router sees.
    ///
    /// Structured bodies are re-serialized and labelled `application/json`
    /// so JSON extractors accept them whatever the original content type.
    pub fn into_request(self) -> Result<Request<Body>, AdapterError> {
        let uri = match self.query.as_deref() {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path,
        };

        let mut headers = self.headers;
        let bytes = match self.body {
            EnvelopeBody::Empty => Vec::new(),
            EnvelopeBody::Structured(value) => {
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                serde_json::to_vec(&value)?
            }
            EnvelopeBody::Raw(text) => text.into_bytes(),
            EnvelopeBody::Binary(bytes) => bytes,
        };
        headers.remove(header::TRANSFER_ENCODING);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

        let mut request = Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Body::from(bytes))?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}
