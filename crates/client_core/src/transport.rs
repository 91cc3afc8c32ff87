use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{ProcessRequest, ProcessResponse};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    envelope::{extract_error_message, parse_response_body},
    error::TransportError,
};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/processExcel";

/// Delivers one request envelope to the processing backend.
#[async_trait]
pub trait ProcessingTransport: Send + Sync {
    async fn send(&self, request: &ProcessRequest) -> Result<ProcessResponse, TransportError>;
}

/// JSON over HTTP POST to a fixed endpoint. No retries and no timeout beyond
/// reqwest's defaults.
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(endpoint.trim()).map_err(|e| TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            http: Client::new(),
            endpoint: parsed,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ProcessingTransport for HttpTransport {
    async fn send(&self, request: &ProcessRequest) -> Result<ProcessResponse, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            text_len = request.user_text.len(),
            has_file = request.attachment().is_some(),
            "posting process request"
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = extract_error_message(&body);
            warn!(status = status.as_u16(), %message, "process request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parse_response_body(&body)?;
        info!(
            status = status.as_u16(),
            has_file = parsed.processed_file_base64.is_some(),
            "process response received"
        );
        Ok(parsed)
    }
}
