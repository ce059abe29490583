//! Lifecycle scope binding in-flight requests to an owner
//!
//! A scope is held by whatever owns a unit of UI or work (a view, a page, a
//! job). Dropping it cancels every request tracked by the shared registry,
//! so nothing keeps transferring for an owner that no longer exists.

use std::sync::Arc;

use tracing::debug;

use crate::registry::RequestRegistry;

/// Cancels all registered requests when dropped
#[derive(Debug)]
pub struct RequestScope {
    registry: Arc<RequestRegistry>,
}

impl RequestScope {
    pub fn new(registry: Arc<RequestRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    /// Cancel everything now, keeping the scope alive
    pub fn cancel_all(&self) {
        self.registry.cancel_all();
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        debug!("request scope dropped");
        self.registry.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_cancels_all() {
        let registry = Arc::new(RequestRegistry::new());
        let handle = registry.register("view-load");

        let scope = RequestScope::new(Arc::clone(&registry));
        drop(scope);

        assert!(handle.token().is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_explicit_cancel_all() {
        let registry = Arc::new(RequestRegistry::new());
        let handle = registry.register("view-load");

        let scope = RequestScope::new(Arc::clone(&registry));
        scope.cancel_all();

        assert!(handle.token().is_cancelled());
        assert!(registry.is_empty());

        // Scope can keep being used for later requests
        let again = registry.register("view-reload");
        assert!(!again.token().is_cancelled());
    }
}
