//! Lifecycle hooks observing each request

use crate::config::RequestOptions;
use crate::error::HttpError;
use crate::response::ResponseMeta;

/// Hooks invoked at the boundaries of every call.
///
/// All methods default to no-ops; implementors override the ones they need.
/// Hooks run synchronously on the request path and must stay cheap.
pub trait Interceptor: Send + Sync {
    /// Runs before the request is built; may adjust headers, query, timeout
    fn before_request(&self, _options: &mut RequestOptions) {}

    /// Runs after a response was received, before the body is decoded
    fn after_response(&self, _meta: &ResponseMeta) {}

    /// Runs when a call settles with a non-benign error
    fn on_error(&self, _error: &HttpError) {}
}
