//! Error types for SMTP sessions.

use std::io;

use crate::types::{Reply, ReplyCode};

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to a submission server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or session error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server rejected a command.
    #[error("SMTP error {code}: {message}")]
    Rejected {
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Server rejected the supplied credentials.
    #[error("Authentication rejected ({code}): {message}")]
    AuthenticationFailed {
        /// Reply code (usually 535).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Malformed or unexpected server response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server closed the connection mid-session.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Envelope address could not be parsed.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Server does not offer a required extension.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Builds a rejection error from a server reply.
    #[must_use]
    pub fn rejected(reply: &Reply) -> Self {
        Self::Rejected {
            code: reply.code.as_u16(),
            message: reply.message_text(),
        }
    }

    /// Builds an authentication error from a server reply.
    #[must_use]
    pub fn auth_failed(reply: &Reply) -> Self {
        Self::AuthenticationFailed {
            code: reply.code.as_u16(),
            message: reply.message_text(),
        }
    }

    /// Returns the reply code, if the error came from a server reply.
    #[must_use]
    pub const fn code(&self) -> Option<ReplyCode> {
        match self {
            Self::Rejected { code, .. } | Self::AuthenticationFailed { code, .. } => {
                Some(ReplyCode::new(*code))
            }
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.code().is_some_and(ReplyCode::is_permanent)
    }

    /// Returns true if this is a transient error (4xx) or a dropped connection.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Io(_))
            || self.code().is_some_and(ReplyCode::is_transient)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejected_carries_reply_text() {
        let reply = Reply::new(ReplyCode::new(550), vec!["No such user".to_string()]);
        let err = Error::rejected(&reply);
        assert_eq!(err.to_string(), "SMTP error 550: No such user");
        assert!(err.is_permanent());
        assert!(!err.is_transient());
    }

    #[test]
    fn transient_classification() {
        let reply = Reply::new(ReplyCode::new(451), vec!["Try later".to_string()]);
        assert!(Error::rejected(&reply).is_transient());
        assert!(Error::ConnectionClosed.is_transient());
        assert!(!Error::Protocol("bad".into()).is_transient());
    }

    #[test]
    fn auth_failure_code() {
        let reply = Reply::new(ReplyCode::AUTH_FAILED, vec!["Bad credentials".to_string()]);
        let err = Error::auth_failed(&reply);
        assert_eq!(err.code(), Some(ReplyCode::AUTH_FAILED));
        assert!(err.is_permanent());
    }
}
