//! Bounded in-memory log of classified failures
//!
//! Session-scoped diagnostic buffer: every failure the client sees is
//! classified and recorded here, newest first, with FIFO eviction of the
//! oldest entries beyond the configured capacity. Constructed explicitly
//! and shared via `Arc` so each test or tenant can own its own log.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::{classify, ErrorContext, ErrorInfo, ErrorKind, HttpError};

/// Default capacity of the error log
pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 50;

/// Number of entries included in [`ErrorStats::recent`]
const RECENT_LEN: usize = 5;

/// Aggregate view over the current log contents
#[derive(Debug, Clone)]
pub struct ErrorStats {
    pub total: usize,
    pub by_kind: HashMap<ErrorKind, usize>,
    /// Up to five most recent entries, newest first
    pub recent: Vec<ErrorInfo>,
}

/// Bounded, newest-first log of classified errors
pub struct ErrorLog {
    entries: RwLock<VecDeque<ErrorInfo>>,
    capacity: usize,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG_CAPACITY)
    }
}

impl ErrorLog {
    /// Create a log holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a pre-classified entry, evicting the oldest beyond capacity
    pub fn record(&self, info: ErrorInfo) {
        let mut entries = self.entries.write().expect("error log lock poisoned");
        entries.push_front(info);
        while entries.len() > self.capacity {
            entries.pop_back();
        }
    }

    /// Classify a failure, record it, and return the classification
    pub fn capture(&self, error: &HttpError, context: ErrorContext) -> ErrorInfo {
        let info = classify(error, &context);
        if info.kind.is_benign() {
            debug!(kind = info.kind.as_str(), "absorbed benign request failure");
        } else {
            warn!(kind = info.kind.as_str(), message = %info.message, "request failed");
        }
        self.record(info.clone());
        info
    }

    /// Defensive copy of the log, newest first
    pub fn entries(&self) -> Vec<ErrorInfo> {
        self.entries
            .read()
            .expect("error log lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("error log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts per kind plus the most recent entries
    pub fn stats(&self) -> ErrorStats {
        let entries = self.entries.read().expect("error log lock poisoned");
        let mut by_kind: HashMap<ErrorKind, usize> = HashMap::new();
        for info in entries.iter() {
            *by_kind.entry(info.kind).or_insert(0) += 1;
        }
        ErrorStats {
            total: entries.len(),
            by_kind,
            recent: entries.iter().take(RECENT_LEN).cloned().collect(),
        }
    }

    pub fn clear(&self) {
        self.entries.write().expect("error log lock poisoned").clear();
    }

    /// Last-resort net around a settled request: logs any error, swallows
    /// benign (Abort-classified) failures as `Ok(None)`, and re-surfaces
    /// everything else untouched.
    pub fn absorb<T>(
        &self,
        result: Result<T, HttpError>,
        context: ErrorContext,
    ) -> Result<Option<T>, HttpError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                let info = self.capture(&error, context);
                if info.kind.is_benign() {
                    Ok(None)
                } else {
                    Err(error)
                }
            }
        }
    }
}
