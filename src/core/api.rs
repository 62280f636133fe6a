//! Control API client - HTTP access to the VM control service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::vm::VmAction;

pub const STATUS_PATH: &str = "/api/vm/status";
pub const TOGGLE_PATH: &str = "/api/vm/toggle";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("control API base URL is missing")]
    BaseUrlMissing,
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("failed to read response: {message}")]
    Read { message: String },
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("unexpected response payload: {message}")]
    Decode { message: String },
    #[error("no response within {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

/// Power state reported by `GET /api/vm/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    pub status: RemoteState,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleRequest {
    pub action: VmAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub url: Option<String>,
}

/// Operations offered by the VM control service
#[async_trait]
pub trait ControlApi: Send + Sync {
    async fn status(&self) -> Result<StatusResponse, ApiError>;

    async fn toggle(&self, action: VmAction) -> Result<ToggleResponse, ApiError>;
}

/// `reqwest` implementation of [`ControlApi`]
#[derive(Debug, Clone)]
pub struct HttpControlApi {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpControlApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            base_url,
            timeout,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request_id() -> String {
        format!("req_{}", Uuid::new_v4().simple())
    }

    fn map_send_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Request {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl ControlApi for HttpControlApi {
    async fn status(&self) -> Result<StatusResponse, ApiError> {
        let url = self.endpoint(STATUS_PATH);
        debug!("GET {}", url);

        let response = self
            .http
            .get(url.as_str())
            .header("x-request-id", Self::request_id())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = read_success_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }

    async fn toggle(&self, action: VmAction) -> Result<ToggleResponse, ApiError> {
        let url = self.endpoint(TOGGLE_PATH);
        debug!("POST {} action={}", url, action);

        let response = self
            .http
            .post(url.as_str())
            .header("x-request-id", Self::request_id())
            .timeout(self.timeout)
            .json(&ToggleRequest { action })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = read_success_body(response).await?;
        Ok(parse_toggle_body(&body))
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| ApiError::Read {
        message: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }

    Ok(bytes.to_vec())
}

/// The toggle body is only meaningful for `url`; anything else counts as no endpoint.
fn parse_toggle_body(body: &[u8]) -> ToggleResponse {
    if body.iter().all(u8::is_ascii_whitespace) {
        return ToggleResponse::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Ignoring unrecognized toggle response body: {}", e);
        ToggleResponse::default()
    })
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> ApiError {
    let body = String::from_utf8_lossy(body).trim().to_string();
    let body = if body.is_empty() {
        "<empty>".to_string()
    } else {
        body
    };
    ApiError::Http { status, body }
}

fn normalize_base_url(base_url: &str) -> Result<String, ApiError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BaseUrlMissing);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
