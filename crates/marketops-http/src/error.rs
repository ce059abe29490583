//! HTTP client error types and failure classification

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// Maximum number of body characters carried inside an error message
pub const PREVIEW_LEN: usize = 100;

/// Classification of a failure into one of six fixed kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Transport-level failure (DNS, connection refused, reset)
    Network,
    /// The configured deadline elapsed before the response arrived
    Timeout,
    /// The request was cancelled (scope teardown, superseding call)
    Abort,
    /// The request or response failed a shape check (URL, body, decode)
    Validation,
    /// The server answered with a business-level failure code
    Business,
    /// Anything that does not fit the other five kinds
    Unknown,
}

impl ErrorKind {
    /// Kinds that represent routine cancellation rather than real failures
    pub fn is_benign(&self) -> bool {
        matches!(self, ErrorKind::Abort)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Abort => "abort",
            ErrorKind::Validation => "validation",
            ErrorKind::Business => "business",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// URL could not be parsed or resolved against the base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request body could not be serialized
    #[error("Failed to serialize request body: {0}")]
    Serialize(String),

    /// A header name or value was not valid
    #[error("Invalid header: {0}")]
    Header(String),

    /// Network request failed at the transport layer
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Request was cancelled before it settled
    #[error("Request was aborted: {0}")]
    Aborted(String),

    /// HTTP error status with a bounded body preview
    #[error("HTTP {status}: {preview}")]
    Status {
        status: reqwest::StatusCode,
        preview: String,
    },

    /// The server answered an API call with an HTML document, usually a
    /// misrouted or missing endpoint rather than a real business error
    #[error("Server returned HTML instead of JSON (HTTP {status}): {preview}")]
    HtmlResponse {
        status: reqwest::StatusCode,
        preview: String,
    },

    /// Response body could not be decoded as the requested type
    #[error("Failed to decode response body: {preview}")]
    Decode { preview: String },

    /// Business envelope carried a non-success code
    #[error("Business error {code}: {message}")]
    Business { code: u16, message: String },

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl HttpError {
    /// Map this error to its fixed classification kind.
    ///
    /// Deterministic: the same error always maps to the same kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::Timeout(_) => ErrorKind::Timeout,
            HttpError::Aborted(_) => ErrorKind::Abort,
            HttpError::Transport(e) => {
                if e.is_timeout() {
                    ErrorKind::Timeout
                } else {
                    ErrorKind::Network
                }
            }
            HttpError::InvalidUrl(_)
            | HttpError::Serialize(_)
            | HttpError::Header(_)
            | HttpError::HtmlResponse { .. }
            | HttpError::Decode { .. } => ErrorKind::Validation,
            HttpError::Business { .. } => ErrorKind::Business,
            HttpError::Status { .. } | HttpError::Build(_) => ErrorKind::Unknown,
        }
    }

    /// True when the error represents routine cancellation
    pub fn is_benign(&self) -> bool {
        self.kind().is_benign()
    }
}

/// Context recorded alongside a classified failure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    pub url: Option<String>,
    pub method: Option<String>,
    pub request_id: Option<String>,
    /// Set when a cancellation was fired by the timeout timer, so an
    /// abort-shaped failure classifies as Timeout rather than Abort
    pub is_timeout: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_timeout_flag(mut self, is_timeout: bool) -> Self {
        self.is_timeout = is_timeout;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Classified description of a single failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub context: ErrorContext,
    /// Epoch milliseconds at classification time
    pub timestamp_ms: i64,
}

/// Classify a raw failure plus context into an [`ErrorInfo`].
///
/// Pure and total: every (error, context) pair maps to exactly one kind.
/// `context.is_timeout` promotes an abort-shaped failure to Timeout, because
/// the timeout timer is realized through the same cancellation mechanism as
/// a manual abort.
pub fn classify(error: &HttpError, context: &ErrorContext) -> ErrorInfo {
    let kind = match error.kind() {
        ErrorKind::Abort if context.is_timeout => ErrorKind::Timeout,
        kind => kind,
    };

    let message = match kind {
        ErrorKind::Timeout => "request timed out".to_string(),
        ErrorKind::Abort => {
            "request was aborted (likely scope teardown or a superseding call)".to_string()
        }
        _ => error.to_string(),
    };

    ErrorInfo {
        kind,
        message,
        context: context.clone(),
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
    }
}

/// Bounded preview of a response body for error messages
pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    }
}
