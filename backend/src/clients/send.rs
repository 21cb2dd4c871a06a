use crate::error::TransportError;
use crate::pipeline::dispatch::SendEndpoint;
use common::model::merge::{SendRequest, SendResponse};
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

/// Longest slice of a non-JSON error body echoed back to the console.
const MAX_ERROR_BODY: usize = 200;

/// The send endpoint reached over HTTP.
#[derive(Clone)]
pub struct HttpSendEndpoint {
    http_client: Client,
    url: String,
    timeout: Duration,
}

impl HttpSendEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let url = url.into();
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connect(format!("Failed to create HTTP client: {}", e)))?;

        info!("Send endpoint client initialized for {}", url);

        Ok(Self {
            http_client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_decode() || err.is_body() {
            TransportError::MalformedResponse(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    }
}

impl SendEndpoint for HttpSendEndpoint {
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, TransportError> {
        debug!(
            "POST {} with {} recipients for template {}",
            self.url,
            request.recipients.len(),
            request.template_id
        );

        let response = self
            .http_client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(TransportError::Server {
                status: status.as_u16(),
                message: error_message(&body, status.canonical_reason()),
            });
        }

        serde_json::from_slice::<SendResponse>(&body)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}

/// Best description of a failed call: the endpoint's own message when the body
/// is a send response, otherwise the start of the raw body or the reason phrase.
fn error_message(body: &[u8], reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_slice::<SendResponse>(body) {
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            return message;
        }
        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            return errors.join("; ");
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        reason.unwrap_or("Unknown error").to_string()
    } else {
        text.chars().take(MAX_ERROR_BODY).collect()
    }
}
