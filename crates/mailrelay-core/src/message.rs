//! Send requests and the messages built from them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use mailrelay_smtp::{Address, Mailbox};

/// Which account a request should go out through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccountSelector {
    /// The configured `default_account`.
    #[default]
    Default,
    /// An account by exact name.
    Named(String),
}

impl From<&str> for AccountSelector {
    fn from(value: &str) -> Self {
        if value == "default" {
            Self::Default
        } else {
            Self::Named(value.to_string())
        }
    }
}

impl From<String> for AccountSelector {
    fn from(value: String) -> Self {
        if value == "default" {
            Self::Default
        } else {
            Self::Named(value)
        }
    }
}

impl fmt::Display for AccountSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Process-unique identity of a send request, used to correlate outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request to send one plain-text mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Correlation id.
    pub id: RequestId,
    /// Recipient.
    pub to_address: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body_text: String,
    /// Account to send through.
    pub account: AccountSelector,
}

impl SendRequest {
    /// Creates a request routed through the default account.
    #[must_use]
    pub fn new(
        to_address: impl Into<String>,
        subject: impl Into<String>,
        body_text: impl Into<String>,
    ) -> Self {
        Self {
            id: RequestId::next(),
            to_address: to_address.into(),
            subject: subject.into(),
            body_text: body_text.into(),
            account: AccountSelector::Default,
        }
    }

    /// Routes the request through a specific account.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<AccountSelector>) -> Self {
        self.account = account.into();
        self
    }

    /// The canned request used to check a mail setup.
    #[must_use]
    pub fn test_mail() -> Self {
        Self::new("root@localhost", "Testmail", "Hello dear test mail receiver!")
    }
}

/// A fully addressed plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Rendered sender.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Creation time.
    pub date: DateTime<Utc>,
    /// Message-ID including the angle brackets, if assigned.
    pub message_id: Option<String>,
}

impl OutgoingMessage {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            date: Utc::now(),
            message_id: None,
        }
    }

    /// Assigns a Message-ID on `hostname`.
    #[must_use]
    pub fn with_message_id(mut self, hostname: &str) -> Self {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        self.message_id = Some(format!(
            "<{}.{seq}.mailrelay@{hostname}>",
            self.date.timestamp_micros()
        ));
        self
    }

    /// Envelope sender and recipient.
    ///
    /// Both header values may carry a display name; only the address is
    /// used for the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if either address does not parse.
    pub fn envelope(&self) -> mailrelay_smtp::Result<(Address, Address)> {
        let from = Mailbox::parse(&self.from)?.address;
        let to = Mailbox::parse(&self.to)?.address;
        Ok((from, to))
    }

    /// Builds the RFC 5322 text of the message.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        use std::fmt::Write;

        let mut message = String::new();

        let _ = writeln!(message, "Date: {}\r", self.date.to_rfc2822());
        let _ = writeln!(message, "From: {}\r", header_value(&self.from));
        let _ = writeln!(message, "To: {}\r", header_value(&self.to));
        let _ = writeln!(message, "Subject: {}\r", encode_subject(&self.subject));
        if let Some(id) = &self.message_id {
            let _ = writeln!(message, "Message-ID: {}\r", header_value(id));
        }
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");

        message.push_str("\r\n");
        message.push_str(&self.body);
        if !self.body.ends_with('\n') {
            message.push_str("\r\n");
        }

        message
    }

    /// Builds the message text with bare `\n` line endings, as local
    /// mail commands expect on stdin.
    #[must_use]
    pub fn to_local_text(&self) -> String {
        self.to_rfc5322().replace("\r\n", "\n").replace('\r', "\n")
    }
}

fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

// Longest input per encoded-word that keeps it under 75 characters.
const ENCODED_WORD_CHUNK: usize = 45;

fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        return subject;
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in subject.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(format!("=?UTF-8?B?{}?=", BASE64.encode(&chunk)));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(format!("=?UTF-8?B?{}?=", BASE64.encode(&chunk)));
    }

    words.join("\r\n ")
}
