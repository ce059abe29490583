//! HTTP client configuration and per-call request options

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::interceptor::Interceptor;

/// HTTP client configuration
///
/// Client-wide defaults; every field can be overridden per call through
/// [`RequestOptions`], with the per-call value taking precedence.
#[derive(Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base URL resolved against relative request paths
    #[serde(default)]
    pub base_url: Option<String>,

    /// Total request deadline
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Default headers attached to every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Hooks observing the request lifecycle; not part of the serialized form
    #[serde(skip)]
    pub interceptor: Option<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("headers", &self.headers)
            .field("user_agent", &self.user_agent)
            .field("interceptor", &self.interceptor.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            headers: HashMap::new(),
            user_agent: default_user_agent(),
            interceptor: None,
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL for relative request paths
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the total request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Add a default header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Install lifecycle hooks
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }
}

/// How the response body should be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// Parse the body as JSON (best-effort, regardless of content-type)
    #[default]
    Json,
    /// Return the body as text
    Text,
    /// Return the raw bytes
    Bytes,
}

/// Request body variants
#[derive(Default)]
pub enum RequestBody {
    #[default]
    None,
    /// Serialized as JSON with `Content-Type: application/json`
    Json(serde_json::Value),
    /// Sent as `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// Sent as multipart form data; the transport sets the boundary
    Multipart(reqwest::multipart::Form),
    /// Passed through unchanged as text
    Text(String),
    /// Passed through unchanged as bytes
    Raw(Vec<u8>),
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::None => write!(f, "None"),
            RequestBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            RequestBody::Form(pairs) => f.debug_tuple("Form").field(pairs).finish(),
            RequestBody::Multipart(_) => write!(f, "Multipart(..)"),
            RequestBody::Text(t) => f.debug_tuple("Text").field(t).finish(),
            RequestBody::Raw(b) => write!(f, "Raw({} bytes)", b.len()),
        }
    }
}

/// Per-call request options, merged over [`HttpConfig`] defaults
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Overrides the client-wide deadline for this call
    pub timeout: Option<Duration>,
    pub response: ResponseKind,
    /// Explicit request id; equal ids supersede each other.
    /// When absent a collision-free id is generated per call.
    pub request_id: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Append a query parameter; values are stringified and percent-encoded
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_body(RequestBody::Json(value))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_response(mut self, response: ResponseKind) -> Self {
        self.response = response;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

// Default value functions for serde
fn default_timeout() -> Duration {
    Duration::from_millis(30_000)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    format!("MarketOps/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.base_url.is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let config = HttpConfig::new()
            .with_base_url("https://api.marketops.test")
            .with_timeout(Duration::from_secs(5))
            .with_header("x-tenant", "acme");

        assert_eq!(config.base_url.as_deref(), Some("https://api.marketops.test"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.headers.get("x-tenant").map(String::as_str), Some("acme"));
    }

    #[test]
    fn test_request_options_defaults() {
        let options = RequestOptions::new();
        assert!(options.method.is_none());
        assert!(options.timeout.is_none());
        assert!(matches!(options.body, RequestBody::None));
        assert_eq!(options.response, ResponseKind::Json);
    }

    #[test]
    fn test_query_values_are_stringified() {
        let options = RequestOptions::new()
            .with_query("q", "a b")
            .with_query("page", 2);

        assert_eq!(options.query[0], ("q".to_string(), "a b".to_string()));
        assert_eq!(options.query[1], ("page".to_string(), "2".to_string()));
    }
}
