//! Delivery backends.
//!
//! A [`Transport`] takes one account and one message and always produces a
//! [`DeliveryReport`]: the ordered trace of what happened and, on failure,
//! why. Transports never return early with an error; every failure is a
//! report.

mod command;
mod smtp;

pub use command::CommandTransport;
pub use smtp::SmtpTransport;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::account::OutboundAccount;
use crate::message::{OutgoingMessage, SendRequest};

/// Why a delivery attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The attempt ran past its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connecting to or talking with the server failed at the I/O level.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server refused the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server refused a command or answered unexpectedly.
    #[error("protocol failure: {0}")]
    Protocol(String),

    /// A sender or recipient address could not be used.
    #[error("invalid address: {0}")]
    Address(String),

    /// The delegate command could not be run or exited non-zero.
    #[error("delegate command failed: {0}")]
    Process(String),

    /// The delivery task died before producing a report.
    #[error("delivery aborted: {0}")]
    Aborted(String),
}

impl From<mailrelay_smtp::Error> for DeliveryError {
    fn from(err: mailrelay_smtp::Error) -> Self {
        use mailrelay_smtp::Error as E;
        match err {
            E::AuthenticationFailed { .. } => Self::Authentication(err.to_string()),
            E::Io(_) | E::ConnectionClosed | E::Tls(_) => Self::Connection(err.to_string()),
            E::InvalidAddress(_) => Self::Address(err.to_string()),
            _ => Self::Protocol(err.to_string()),
        }
    }
}

/// Ordered trace lines of one delivery attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryLog(Vec<String>);

impl DeliveryLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a line and traces it.
    pub fn step(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!("{line}");
        self.0.push(line);
    }

    /// Lines in order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// True if any line contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|line| line.contains(needle))
    }
}

impl std::fmt::Display for DeliveryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("\n"))
    }
}

/// What a transport reports back for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Trace of the attempt.
    pub log: DeliveryLog,
    /// Failure reason, `None` on success.
    pub error: Option<DeliveryError>,
}

impl DeliveryReport {
    /// A successful attempt.
    #[must_use]
    pub const fn delivered(log: DeliveryLog) -> Self {
        Self { log, error: None }
    }

    /// A failed attempt; the reason is appended to the log.
    #[must_use]
    pub fn failed(mut log: DeliveryLog, error: DeliveryError) -> Self {
        log.step(format!("Could not send email: {error}"));
        Self {
            log,
            error: Some(error),
        }
    }

    /// True if the message was handed off.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Final result of one send request, delivered to the reporter once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// The request this outcome answers.
    pub request: SendRequest,
    /// Name of the account used.
    pub account: String,
    /// Trace of the attempt.
    pub log: DeliveryLog,
    /// Failure reason, `None` on success.
    pub error: Option<DeliveryError>,
}

impl DeliveryOutcome {
    /// Pairs a transport report with its request.
    #[must_use]
    pub fn new(request: SendRequest, account: impl Into<String>, report: DeliveryReport) -> Self {
        Self {
            request,
            account: account.into(),
            log: report.log,
            error: report.error,
        }
    }

    /// True if the message was handed off.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// A delivery backend.
pub trait Transport: Send + Sync + 'static {
    /// Attempts to deliver `message` through `account`.
    fn send(
        &self,
        account: &OutboundAccount,
        message: &OutgoingMessage,
    ) -> impl Future<Output = DeliveryReport> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smtp_errors_map_to_kinds() {
        let auth = mailrelay_smtp::Error::AuthenticationFailed {
            code: 535,
            message: "bad".to_string(),
        };
        assert!(matches!(DeliveryError::from(auth), DeliveryError::Authentication(_)));
        assert!(matches!(
            DeliveryError::from(mailrelay_smtp::Error::ConnectionClosed),
            DeliveryError::Connection(_)
        ));
        assert!(matches!(
            DeliveryError::from(mailrelay_smtp::Error::Protocol("x".to_string())),
            DeliveryError::Protocol(_)
        ));
    }

    #[test]
    fn failed_report_logs_reason() {
        let mut log = DeliveryLog::new();
        log.step("Connecting to localhost:25");
        let report = DeliveryReport::failed(log, DeliveryError::Timeout(Duration::from_secs(30)));
        assert!(!report.success());
        assert_eq!(report.log.lines().len(), 2);
        assert!(report.log.mentions("timed out after 30s"));
    }
}
