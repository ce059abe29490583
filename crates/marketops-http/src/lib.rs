//! Request/response lifecycle layer for MarketOps
//!
//! Abortable, timed HTTP client with failure classification, built for
//! callers that start many short-lived requests and tear them down on
//! navigation or view unmount.
//!
//! ## Features
//!
//! - **Cooperative cancellation**: one handle per in-flight request in a
//!   [`RequestRegistry`]; equal request ids supersede each other
//! - **Lifecycle scopes**: dropping a [`RequestScope`] cancels everything
//! - **Failure classification**: six fixed kinds via [`classify`], with a
//!   bounded [`ErrorLog`] for diagnostics
//! - **Sentinel aborts**: cancelled calls settle as [`Outcome::Aborted`]
//!   instead of forcing callers to catch routine cancellations
//! - **Shape checks**: HTML-instead-of-JSON responses and malformed bodies
//!   surface as distinct errors with bounded previews

pub mod client;
pub mod config;
pub mod error;
pub mod error_log;
pub mod interceptor;
pub mod registry;
pub mod response;
pub mod scope;

pub use client::{HttpClient, HttpClientTrait};
pub use config::{HttpConfig, RequestBody, RequestOptions, ResponseKind};
pub use error::{classify, ErrorContext, ErrorInfo, ErrorKind, HttpError, Result};
pub use error_log::{ErrorLog, ErrorStats, DEFAULT_ERROR_LOG_CAPACITY};
pub use interceptor::Interceptor;
pub use registry::{RequestHandle, RequestRegistry};
pub use response::{AbortInfo, HttpResponse, Outcome, ResponseMeta, ABORTED_STATUS};
pub use scope::RequestScope;

/// Re-export commonly used types
pub use reqwest::{header, Method, StatusCode};
