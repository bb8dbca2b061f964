//! Errors returned by the Fastly API client

use serde::Deserialize;
use thiserror::Error;

/// Failure of a single API round trip.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Remote API answered with a non-success status.
    #[error("{status} - {message}")]
    Status {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    #[error("error performing request to {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error decoding response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("error building API client")]
    Client(#[source] reqwest::Error),

    #[error("invalid API endpoint: {0}")]
    Endpoint(String),
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error payload the API returns for failed requests.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    msg: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    /// Build a status error from the response code and raw body.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .msg
            .filter(|m| !m.is_empty())
            .or_else(|| reason.map(str::to_string))
            .unwrap_or_else(|| "Unknown Error".to_string());
        ApiError::Status {
            status,
            message,
            detail: parsed.detail.filter(|d| !d.is_empty()),
        }
    }

    /// Shorthand used by fakes and tests.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Help text shown below the error message.
    pub fn remediation(&self) -> Option<String> {
        match self {
            ApiError::Status { status: 401, .. } | ApiError::Status { status: 403, .. } => Some(
                "Check your API token is valid with `fastly whoami`, or create a profile with `fastly profile create`"
                    .to_string(),
            ),
            ApiError::Status {
                detail: Some(detail),
                ..
            } => Some(detail.clone()),
            ApiError::Transport { .. } => Some(
                "Check your network connection and the configured API endpoint (--endpoint)"
                    .to_string(),
            ),
            _ => None,
        }
    }
}
