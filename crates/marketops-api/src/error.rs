//! Business API error types

use marketops_http::HttpError;
use thiserror::Error;

/// Result type for business API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised by the envelope layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport or protocol failure from the underlying client
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The envelope carried a non-success code
    #[error("{message}")]
    Business { code: u16, message: String },

    /// A successful envelope arrived without the expected payload
    #[error("Business response carried no data")]
    MissingData,

    /// The body was valid JSON but not a `{code, data, msg}` envelope
    #[error("Malformed business envelope: {0}")]
    Envelope(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_error_message() {
        let error = ApiError::Business {
            code: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(error.to_string(), "forbidden");
    }

    #[test]
    fn test_http_error_passes_through() {
        let error = ApiError::from(HttpError::InvalidUrl("nope".to_string()));
        assert!(matches!(error, ApiError::Http(HttpError::InvalidUrl(_))));
    }
}
