//! # mailrelay-core
//!
//! Outbound mail dispatch for applications that need to send notification
//! mail through one of several configured accounts.
//!
//! This crate provides:
//! - Account registry with named outbound (SMTP) and inbound (IMAP/POP3) profiles
//! - JSON configuration with validation and live snapshot publication
//! - Sender address templates (`{{server}}`, `{{hostname}}`)
//! - Delivery over a direct SMTP session or a local `sendmail`-style command
//! - A bounded worker pool and an asynchronous result reporter
//!
//! ## Flow
//!
//! ```text
//! MailEvent ─→ MailTransmitter ─→ Dispatcher ─→ WorkerPool ─→ Transport
//!                                     │                          │
//!                              ConfigSource              DeliveryOutcome
//!                                                              │
//!                                                       ResultReporter
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
pub mod dispatcher;
mod error;
pub mod identity;
pub mod message;
pub mod render;
pub mod reporter;
pub mod transmitter;
pub mod transport;
pub mod worker;

pub use account::{
    Credentials, InboundAccount, InboundProtocol, OutboundAccount, OutboundProtocol, Security,
    ValidationError, ValidationResult,
};
pub use config::{ConfigSource, ConfigStore, MailConfig, ReceiverConfig, TransmitterConfig};
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::{Error, Result};
pub use message::{AccountSelector, OutgoingMessage, RequestId, SendRequest};
pub use render::{TemplateVars, render};
pub use reporter::{ReportSummary, ResultReporter};
pub use transmitter::{MailEvent, MailTransmitter, TEST_MAIL_ACTION};
pub use transport::{
    CommandTransport, DeliveryError, DeliveryLog, DeliveryOutcome, DeliveryReport, SmtpTransport,
    Transport,
};
pub use worker::{Job, WorkerPool};
