//! Business wire envelope
//!
//! Business endpoints wrap their payload in `{code, data, msg, total}`.
//! `code` is a string; exactly `"200"` and `"0"` mean success, anything
//! else is a business failure carrying `msg`.

use serde::{Deserialize, Serialize};

/// Numeric code used when the envelope's string code does not parse
pub const FALLBACK_BUSINESS_CODE: u16 = 400;

/// The `{code, data, msg, total}` wrapper around business payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub code: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self.code.as_str(), "200" | "0")
    }

    /// Numeric form of `code`, falling back to [`FALLBACK_BUSINESS_CODE`]
    pub fn numeric_code(&self) -> u16 {
        self.code.parse().unwrap_or(FALLBACK_BUSINESS_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(code: &str) -> Envelope<serde_json::Value> {
        Envelope {
            code: code.to_string(),
            data: None,
            msg: None,
            total: None,
        }
    }

    #[test]
    fn test_success_codes() {
        assert!(envelope("200").is_success());
        assert!(envelope("0").is_success());
        assert!(!envelope("403").is_success());
        assert!(!envelope("ok").is_success());
        assert!(!envelope("2000").is_success());
    }

    #[test]
    fn test_numeric_code_fallback() {
        assert_eq!(envelope("403").numeric_code(), 403);
        assert_eq!(envelope("SESSION_EXPIRED").numeric_code(), 400);
        assert_eq!(envelope("-1").numeric_code(), 400);
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":"200"}"#).unwrap();
        assert!(envelope.is_success());
        assert!(envelope.data.is_none());
        assert!(envelope.msg.is_none());
        assert!(envelope.total.is_none());
    }
}
