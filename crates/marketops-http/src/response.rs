//! Normalized request outcomes
//!
//! A settled call is either `Completed` with a decoded response or
//! `Aborted` with a sentinel describing a routine cancellation. Aborts are
//! ordinary values rather than errors so callers are not forced to catch
//! cancellations caused by scope teardown or superseding calls.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Status code carried by the abort sentinel (non-standard "client closed
/// request")
pub const ABORTED_STATUS: u16 = 499;

/// Decoded response of a completed call
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
    pub data: T,
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
}

impl<T> HttpResponse<T> {
    /// Replace the payload, keeping the response metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> HttpResponse<U> {
        HttpResponse {
            data: f(self.data),
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
        }
    }
}

/// Sentinel describing a cancelled call
#[derive(Debug, Clone)]
pub struct AbortInfo {
    /// Always [`ABORTED_STATUS`]
    pub status: u16,
    pub message: String,
    pub request_id: String,
}

impl AbortInfo {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            status: ABORTED_STATUS,
            message: "request aborted".to_string(),
            request_id: request_id.into(),
        }
    }
}

/// Tagged result of one settled call
#[derive(Debug)]
pub enum Outcome<T> {
    Completed(HttpResponse<T>),
    Aborted(AbortInfo),
}

impl<T> Outcome<T> {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted(_))
    }

    /// The completed response, discarding the abort sentinel
    pub fn into_completed(self) -> Option<HttpResponse<T>> {
        match self {
            Outcome::Completed(response) => Some(response),
            Outcome::Aborted(_) => None,
        }
    }

    /// The decoded payload of a completed call
    pub fn into_data(self) -> Option<T> {
        self.into_completed().map(|response| response.data)
    }

    /// Map the payload of a completed call, passing aborts through
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(response) => Outcome::Completed(response.map(f)),
            Outcome::Aborted(info) => Outcome::Aborted(info),
        }
    }
}

/// Response metadata handed to `after_response` hooks before decoding
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub url: String,
    pub status: StatusCode,
    pub status_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_sentinel_status() {
        let info = AbortInfo::new("GET_/items#0");
        assert_eq!(info.status, 499);
        assert_eq!(info.request_id, "GET_/items#0");
    }

    #[test]
    fn test_outcome_accessors() {
        let completed: Outcome<u32> = Outcome::Completed(HttpResponse {
            data: 7,
            status: StatusCode::OK,
            status_text: "OK".into(),
            headers: HeaderMap::new(),
        });
        assert!(!completed.is_aborted());
        assert_eq!(completed.into_data(), Some(7));

        let aborted: Outcome<u32> = Outcome::Aborted(AbortInfo::new("id"));
        assert!(aborted.is_aborted());
        assert!(aborted.into_completed().is_none());
    }

    #[test]
    fn test_map_data() {
        let completed: Outcome<u32> = Outcome::Completed(HttpResponse {
            data: 7,
            status: StatusCode::OK,
            status_text: "OK".into(),
            headers: HeaderMap::new(),
        });
        assert_eq!(completed.map_data(|n| n * 2).into_data(), Some(14));
    }
}
