//! Business envelope layer for MarketOps
//!
//! Wraps the abortable HTTP client with `{code, data, msg, total}`
//! unwrapping: success codes (`"200"`/`"0"`) yield the payload directly,
//! anything else raises a typed business error carrying the server's
//! message and the numeric form of the code.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{ApiClient, Page};
pub use envelope::{Envelope, FALLBACK_BUSINESS_CODE};
pub use error::{ApiError, Result};
