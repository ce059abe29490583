//! Registry of in-flight requests keyed by request id
//!
//! One cancellation handle per logical request. Registering a second handle
//! under the same id supersedes the first: the older token is cancelled and
//! only the newest call for that id may complete.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One in-flight request tracked by the registry
#[derive(Debug, Clone)]
pub struct RequestHandle {
    token: CancellationToken,
    /// Epoch milliseconds at registration time
    created_at_ms: i64,
    /// Distinguishes successive registrations under the same id, so a
    /// superseded call settling late cannot deregister its replacement
    generation: u64,
}

impl RequestHandle {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks cancellation handles for every in-flight request
#[derive(Debug, Default)]
pub struct RequestRegistry {
    handles: DashMap<String, RequestHandle>,
    sequence: AtomicU64,
    generations: AtomicU64,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collision-free default request id.
    ///
    /// The id embeds a monotonic sequence number, so two rapid identical
    /// calls never supersede each other by accident; callers opt in to
    /// superseding by passing an explicit id instead.
    pub fn next_request_id(&self, method: &str, url: &str) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{method}_{url}#{seq}")
    }

    /// Register a handle for `request_id`, superseding any existing one.
    ///
    /// The previous handle for the same id, if any, is cancelled before the
    /// new one is stored (last writer wins).
    pub fn register(&self, request_id: &str) -> RequestHandle {
        let handle = RequestHandle {
            token: CancellationToken::new(),
            created_at_ms: chrono::Utc::now().timestamp_millis(),
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
        };
        if let Some(previous) = self.handles.insert(request_id.to_string(), handle.clone()) {
            debug!(request_id, "superseding in-flight request");
            previous.token.cancel();
        }
        handle
    }

    /// Remove a handle without cancelling it (clean completion).
    ///
    /// Removes only the exact registration the caller owns: a superseded
    /// call settling late must not evict its replacement's live handle.
    pub fn deregister(&self, request_id: &str, generation: u64) {
        self.handles
            .remove_if(request_id, |_, handle| handle.generation == generation);
    }

    /// Cancel and remove the handle for `request_id`; no-op if absent
    pub fn cancel(&self, request_id: &str) {
        if let Some((_, handle)) = self.handles.remove(request_id) {
            handle.token.cancel();
        }
    }

    /// Cancel and remove every outstanding handle.
    ///
    /// Each cancellation is independent; the registry is empty afterwards.
    /// The underlying transfers observe the signal asynchronously.
    pub fn cancel_all(&self) {
        let count = self.handles.len();
        for entry in self.handles.iter() {
            entry.value().token.cancel();
        }
        self.handles.clear();
        if count > 0 {
            debug!(count, "cancelled all in-flight requests");
        }
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.handles.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
