use super::{AdapterError, GatewayResponse};
use axum::body::Bytes;
use serde::Serialize;

const RUNTIME_API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const ERROR_TYPE_HEADER: &str = "lambda-runtime-function-error-type";

/// One pending trigger event fetched from the platform.
#[derive(Debug)]
pub struct Invocation {
    pub request_id: String,
    pub payload: Bytes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorReport<'a> {
    error_message: String,
    error_type: &'a str,
}

/// Client for the function platform's invocation API.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: reqwest::Client,
    base_url: String,
}

impl RuntimeClient {
    /// `runtime_api` is the `host:port` the platform advertises.
    pub fn new(runtime_api: &str) -> Result<Self, AdapterError> {
        // No request timeout: fetching the next event is a long poll.
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: format!("http://{}/{}/runtime", runtime_api, RUNTIME_API_VERSION),
        })
    }

    /// Blocks until the platform hands over the next event.
    pub async fn next_invocation(&self) -> Result<Invocation, AdapterError> {
        let response = self
            .client
            .get(format!("{}/invocation/next", self.base_url))
            .send()
            .await?
            .error_for_status()?;

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| AdapterError::Runtime("invocation without a request id".to_string()))?;
        let payload = response.bytes().await?;

        Ok(Invocation { request_id, payload })
    }

    pub async fn respond(
        &self,
        request_id: &str,
        response: &GatewayResponse,
    ) -> Result<(), AdapterError> {
        self.client
            .post(format!("{}/invocation/{}/response", self.base_url, request_id))
            .json(response)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Marks the invocation as failed.
    pub async fn report_error(
        &self,
        request_id: &str,
        error: &AdapterError,
    ) -> Result<(), AdapterError> {
        self.post_error(format!("{}/invocation/{}/error", self.base_url, request_id), error)
            .await
    }

    async fn post_error(&self, url: String, error: &AdapterError) -> Result<(), AdapterError> {
        let report = ErrorReport {
            error_message: error.to_string(),
            error_type: error.error_type(),
        };
        self.client
            .post(url)
            .header(ERROR_TYPE_HEADER, report.error_type)
            .json(&report)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
