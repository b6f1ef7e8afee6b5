//! # mailrelay-smtp
//!
//! Async SMTP submission client used by the `mailrelay` dispatcher.
//!
//! ## Features
//!
//! - **Type-state session**: the compiler enforces greeting, optional
//!   authentication, envelope, then data
//! - **TLS**: implicit TLS (SMTPS) and STARTTLS upgrade
//! - **Authentication**: PLAIN and LOGIN, picked from the EHLO reply
//! - **HELO fallback** for servers that do not speak ESMTP
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailrelay_smtp::{Address, Client};
//! use mailrelay_smtp::connection::connect;
//!
//! let stream = connect("localhost", 25).await?;
//! let client = Client::from_stream(stream).await?.ehlo("relay.example.org").await?;
//!
//! let client = client
//!     .mail_from(Address::new("bot@localhost")?)
//!     .await?
//!     .rcpt_to(Address::new("root@localhost")?)
//!     .await?
//!     .data()
//!     .await?;
//!
//! let (client, reply) = client.send_message(b"Subject: Test\r\n\r\nHello\r\n").await?;
//! println!("accepted: {reply}");
//! client.quit().await?;
//! ```
//!
//! ## Session States
//!
//! ```text
//! Connected ─── authenticate() ──→ Authenticated
//!     │                                 │
//!     └──────────── mail_from() ────────┘
//!                      │
//!               MailTransaction ── rcpt_to() ──→ RecipientAdded ── data() ──→ Data
//!                                                                              │
//!                     Connected ←──────────── send_message() ──────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpConnection, SmtpStream,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Mailbox, Reply, ReplyClass, ReplyCode};
