//! Error types for litelog
//!
//! This module defines the error types used throughout the litelog crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations. The `Display` output of every
//! variant is the human-readable message shown in the error footer.
//!
//! # Example
//!
//! ```
//! use litelog_core::error::{LitelogError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to LitelogError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for litelog operations
#[derive(Error, Debug)]
pub enum LitelogError {
    /// Base URL or admin key missing; blocks all fetching
    #[error("{0}")]
    InvalidConfiguration(String),

    /// The gateway answered with a non-200 status
    #[error("{}", status_message(*status))]
    Status {
        /// HTTP status code returned by the gateway
        status: u16,
    },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed server response
    #[error("Failed to decode the server response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL cannot be parsed
    #[error("The provided Base URL is invalid: {0}")]
    InvalidUrl(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

impl LitelogError {
    /// Configuration error used when base URL or admin key are missing
    pub fn not_configured() -> Self {
        Self::InvalidConfiguration(
            "Settings are not configured. Please configure them with `litelog config set`."
                .to_string(),
        )
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn status_message(status: u16) -> String {
    if status == 401 {
        "Authentication failed. Please check your Admin API Key.".to_string()
    } else {
        format!("The API request failed with status code: {status}.")
    }
}

/// Convenience type alias for Results in litelog
///
/// # Example
///
/// ```
/// use litelog_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, LitelogError>;
