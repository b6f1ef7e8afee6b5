//! Error types for the core library.

use thiserror::Error;

use crate::account::ValidationError;

/// Errors that can occur while configuring or dispatching mail.
///
/// Delivery failures are not represented here; they are reported through
/// [`crate::DeliveryOutcome`] once a backend has run.
#[derive(Debug, Error)]
pub enum Error {
    /// Account selector matched no configured account.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Worker queue is at capacity; the request was not accepted.
    #[error("Delivery queue is full ({capacity} pending sends)")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// Worker pool has shut down.
    #[error("Delivery workers have shut down")]
    PoolClosed,

    /// Command action is not registered.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {}", format_validation(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
