//! Account model types.

use serde::{Deserialize, Serialize};

/// Security/encryption mode for a mail server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (socket wrapped at connect time).
    #[default]
    Ssl,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Maps the `ssl`/`tls` flag pair onto a mode.
    ///
    /// `ssl` wins when both are set: the socket is already wrapped before an
    /// upgrade could be issued.
    #[must_use]
    pub const fn from_flags(ssl: bool, tls: bool) -> Self {
        match (ssl, tls) {
            (true, _) => Self::Ssl,
            (false, true) => Self::StartTls,
            (false, false) => Self::None,
        }
    }

    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Ssl => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// Username/password pair for an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Secret.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Outbound transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundProtocol {
    /// SMTP submission.
    #[default]
    Smtp,
}

/// Inbound transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundProtocol {
    /// IMAP4.
    #[default]
    Imap,
    /// POP3.
    Pop3,
}

impl InboundProtocol {
    /// Get default port for the protocol and security mode.
    #[must_use]
    pub const fn default_port(self, security: Security) -> u16 {
        match (self, security) {
            (Self::Imap, Security::Ssl) => 993,
            (Self::Imap, Security::None | Security::StartTls) => 143,
            (Self::Pop3, Security::Ssl) => 995,
            (Self::Pop3, Security::None | Security::StartTls) => 110,
        }
    }
}

/// One named outbound profile in the account registry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundAccount {
    /// Unique profile name, used by explicit routing.
    pub name: String,
    /// Mail server to send through.
    pub server: String,
    /// Mail server port.
    pub port: u16,
    /// Wrap the connection in TLS from the start.
    pub ssl: bool,
    /// Upgrade a plaintext connection with STARTTLS.
    pub tls: bool,
    /// Transport protocol.
    pub protocol: OutboundProtocol,
    /// Sender template; `{{server}}` and `{{hostname}}` are expanded per send.
    pub mail_from: String,
    /// SMTP username; empty means anonymous.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Hand messages to a local command instead of speaking SMTP.
    pub use_sendmail: bool,
    /// Extra arguments for the local command, split on whitespace.
    pub sendmail_extra_arguments: String,
    /// Local command to run.
    pub sendmail_binary: String,
}

impl Default for OutboundAccount {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            server: "localhost".to_string(),
            port: Self::default_port(Security::Ssl),
            ssl: true,
            tls: false,
            protocol: OutboundProtocol::Smtp,
            mail_from: "bot@{{server}}".to_string(),
            username: String::new(),
            password: String::new(),
            use_sendmail: false,
            sendmail_extra_arguments: "-t -oi".to_string(),
            sendmail_binary: "/usr/bin/sendmail".to_string(),
        }
    }
}

impl std::fmt::Debug for OutboundAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundAccount")
            .field("name", &self.name)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("security", &self.security())
            .field("mail_from", &self.mail_from)
            .field("username", &self.username)
            .field("use_sendmail", &self.use_sendmail)
            .field("sendmail_binary", &self.sendmail_binary)
            .finish_non_exhaustive()
    }
}

impl OutboundAccount {
    /// The stock plaintext profile for a local MTA on port 25.
    #[must_use]
    pub fn localhost() -> Self {
        Self {
            port: Self::default_port(Security::None),
            ssl: false,
            ..Self::default()
        }
    }

    /// Creates a direct SMTP profile.
    #[must_use]
    pub fn smtp(name: impl Into<String>, server: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            port,
            ssl: false,
            ..Self::default()
        }
    }

    /// Creates a profile delegating to a local command.
    #[must_use]
    pub fn sendmail(
        name: impl Into<String>,
        binary: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            use_sendmail: true,
            sendmail_binary: binary.into(),
            sendmail_extra_arguments: arguments.into(),
            ..Self::localhost()
        }
    }

    /// Get default port for the security mode.
    #[must_use]
    pub const fn default_port(security: Security) -> u16 {
        match security {
            Security::None => 25,
            Security::StartTls => 587,
            Security::Ssl => 465,
        }
    }

    /// Connection security derived from the `ssl`/`tls` flags.
    #[must_use]
    pub const fn security(&self) -> Security {
        Security::from_flags(self.ssl, self.tls)
    }

    /// Credentials, if a username is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        (!self.username.is_empty()).then(|| Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }

    /// Arguments passed to the delegate command.
    #[must_use]
    pub fn sendmail_args(&self) -> Vec<&str> {
        self.sendmail_extra_arguments.split_whitespace().collect()
    }
}

/// One named inbound profile. Only the shape is defined; polling lives
/// elsewhere.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundAccount {
    /// Unique profile name.
    pub name: String,
    /// Mail server to poll.
    pub server: String,
    /// Mail server port.
    pub port: u16,
    /// Wrap the connection in TLS from the start.
    pub ssl: bool,
    /// Upgrade a plaintext connection with STARTTLS.
    pub tls: bool,
    /// Mailbox access protocol.
    pub protocol: InboundProtocol,
    /// Login name; empty means anonymous.
    pub username: String,
    /// Secret.
    pub password: String,
    /// Fetch through a local command instead of a direct session.
    pub use_fetchmail: bool,
    /// Extra arguments for the fetch command.
    pub fetchmail_extra_arguments: String,
    /// Fetch command to run.
    pub fetchmail_binary: String,
}

impl Default for InboundAccount {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            server: "localhost".to_string(),
            port: InboundProtocol::Imap.default_port(Security::Ssl),
            ssl: true,
            tls: false,
            protocol: InboundProtocol::Imap,
            username: String::new(),
            password: String::new(),
            use_fetchmail: false,
            fetchmail_extra_arguments: String::new(),
            fetchmail_binary: "/usr/bin/fetchmail".to_string(),
        }
    }
}

impl std::fmt::Debug for InboundAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundAccount")
            .field("name", &self.name)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("security", &self.security())
            .field("username", &self.username)
            .field("use_fetchmail", &self.use_fetchmail)
            .finish_non_exhaustive()
    }
}

impl InboundAccount {
    /// The stock local IMAP profile with STARTTLS on port 143.
    #[must_use]
    pub fn localhost() -> Self {
        Self {
            port: InboundProtocol::Imap.default_port(Security::StartTls),
            ssl: false,
            tls: true,
            ..Self::default()
        }
    }

    /// Connection security derived from the `ssl`/`tls` flags.
    #[must_use]
    pub const fn security(&self) -> Security {
        Security::from_flags(self.ssl, self.tls)
    }

    /// Credentials, if a username is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        (!self.username.is_empty()).then(|| Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}
