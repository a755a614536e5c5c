// src/upstream/client.rs
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::models::request::EventRequest;
use super::normalize;

/// Errors from the Unite API boundary.
///
/// `Timeout` is special: the mutation dispatcher treats it as recoverable
/// and verifies the outcome by polling before surfacing anything.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("could not reach the Unite API")]
    Network(#[source] reqwest::Error),

    #[error("the Unite API did not respond in time")]
    Timeout,

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        errors: Option<Value>,
    },

    #[error("could not read the Unite API response: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),
}

impl UpstreamError {
    /// Message shown to the dashboard user. Always derived from the upstream
    /// body's `message`/`errors` or a fixed phrase, never a raw error chain.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "The Unite service is unreachable. Please try again.".into(),
            Self::Timeout => "The request timed out. Please try again.".into(),
            Self::Api { message, .. } => message.clone(),
            Self::Parse(_) => "The Unite service returned an unreadable response.".into(),
            Self::Validation(message) => message.clone(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Network(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Parse(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpstreamOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub verify_poll_attempts: u32,
    pub verify_poll_interval: Duration,
}

impl UpstreamOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            verify_poll_attempts: 5,
            verify_poll_interval: Duration::from_secs(2),
        }
    }
}

/// HTTP client for the upstream Unite API. One instance per process; the
/// fixed timeout is deliberately shorter than the backend's worst-case
/// processing so the dispatcher's verify loop can take over.
pub struct UpstreamClient {
    http: Client,
    opts: UpstreamOptions,
}

impl UpstreamClient {
    pub fn new(opts: UpstreamOptions) -> Self {
        let http = Client::builder()
            .timeout(opts.timeout)
            .build()
            .expect("failed to build upstream HTTP client");
        Self { http, opts }
    }

    pub fn options(&self) -> &UpstreamOptions {
        &self.opts
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.opts.base_url.trim_end_matches('/'), path)
    }

    fn authorize(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get_json(&self, path: &str, token: Option<&str>) -> Result<Value, UpstreamError> {
        let builder = Self::authorize(self.http.get(self.endpoint(path)), token);
        let response = builder.send().await?;
        classify_response(response).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Value, UpstreamError> {
        let builder = Self::authorize(self.http.post(self.endpoint(path)), token).json(body);
        let response = builder.send().await?;
        classify_response(response).await
    }

    pub async fn delete_json(&self, path: &str, token: Option<&str>) -> Result<Value, UpstreamError> {
        let builder = Self::authorize(self.http.delete(self.endpoint(path)), token);
        let response = builder.send().await?;
        classify_response(response).await
    }

    /// Fetch and normalize a single request. Detail responses are sometimes
    /// wrapped in a `data` envelope, sometimes not.
    pub async fn fetch_request(
        &self,
        token: Option<&str>,
        request_id: &str,
    ) -> Result<EventRequest, UpstreamError> {
        let body = self
            .get_json(&format!("/api/event-requests/{request_id}"), token)
            .await?;
        let raw = match body.get("data") {
            Some(data) if data.is_object() => data,
            _ => &body,
        };
        normalize::normalize_request(raw).map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

async fn classify_response(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = response.status();
    let text = response.text().await.map_err(UpstreamError::from)?;

    let body: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(err) if status.is_success() => {
                return Err(UpstreamError::Parse(err.to_string()));
            }
            // Non-JSON error bodies still need a usable message
            Err(_) => Value::Null,
        }
    };

    if status.is_success() {
        return Ok(body);
    }

    Err(UpstreamError::Api {
        status: status.as_u16(),
        message: extract_message(&body, status),
        errors: body.get("errors").cloned(),
    })
}

/// Pull a user-facing message out of an upstream error body: `message`
/// first, then the first usable entry of `errors`, then the HTTP reason.
fn extract_message(body: &Value, status: StatusCode) -> String {
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        if !message.trim().is_empty() {
            return message.trim().to_string();
        }
    }
    match body.get("errors") {
        Some(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => return s.trim().to_string(),
                    Value::Object(obj) => {
                        if let Some(Value::String(s)) = obj.get("message") {
                            return s.clone();
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
        _ => {}
    }
    status
        .canonical_reason()
        .unwrap_or("Unite API request failed")
        .to_string()
}
