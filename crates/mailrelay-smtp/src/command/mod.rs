//! SMTP command serialization.

use crate::types::{Address, AuthMechanism};

/// Commands issued by the submission client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO - fallback greeting for servers without ESMTP
    Helo {
        /// Client hostname
        hostname: String,
    },
    /// EHLO - extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - upgrade to TLS
    StartTls,
    /// AUTH - begin authentication
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
        /// Initial response (SASL-IR)
        initial_response: Option<String>,
    },
    /// Bare base64 line answering a 334 challenge
    AuthResponse(String),
    /// MAIL FROM - start mail transaction
    MailFrom {
        /// Reverse path
        from: Address,
        /// BODY parameter (e.g. 8BITMIME)
        body: Option<&'static str>,
    },
    /// RCPT TO - add recipient
    RcptTo {
        /// Forward path
        to: Address,
    },
    /// DATA - begin message content
    Data,
    /// RSET - abort transaction
    Rset,
    /// QUIT - close session
    Quit,
}

impl Command {
    /// Serializes the command into a CRLF-terminated line.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = match self {
            Self::Helo { hostname } => format!("HELO {hostname}"),
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::Auth {
                mechanism,
                initial_response: Some(resp),
            } => format!("AUTH {} {resp}", mechanism.as_str()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.as_str()),
            Self::AuthResponse(resp) => resp.clone(),
            Self::MailFrom {
                from,
                body: Some(body),
            } => format!("MAIL FROM:<{from}> BODY={body}"),
            Self::MailFrom { from, body: None } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Rset => "RSET".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
        .into_bytes();

        line.extend_from_slice(b"\r\n");
        line
    }

    /// Returns a loggable form that never includes credentials.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Auth { mechanism, .. } => format!("AUTH {} ****", mechanism.as_str()),
            Self::AuthResponse(_) => "****".to_string(),
            other => String::from_utf8_lossy(&other.serialize()).trim_end().to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_greetings() {
        let ehlo = Command::Ehlo {
            hostname: "relay.example.org".to_string(),
        };
        assert_eq!(ehlo.serialize(), b"EHLO relay.example.org\r\n");

        let helo = Command::Helo {
            hostname: "relay.example.org".to_string(),
        };
        assert_eq!(helo.serialize(), b"HELO relay.example.org\r\n");
    }

    #[test]
    fn test_auth_plain_with_initial_response() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
        assert_eq!(cmd.redacted(), "AUTH PLAIN ****");
    }

    #[test]
    fn test_auth_login_steps() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        assert_eq!(cmd.serialize(), b"AUTH LOGIN\r\n");
        let resp = Command::AuthResponse("dXNlcg==".to_string());
        assert_eq!(resp.serialize(), b"dXNlcg==\r\n");
        assert_eq!(resp.redacted(), "****");
    }

    #[test]
    fn test_envelope_commands() {
        let from = Command::MailFrom {
            from: Address::new("bot@localhost").unwrap(),
            body: None,
        };
        assert_eq!(from.serialize(), b"MAIL FROM:<bot@localhost>\r\n");

        let from_8bit = Command::MailFrom {
            from: Address::new("bot@localhost").unwrap(),
            body: Some("8BITMIME"),
        };
        assert_eq!(from_8bit.serialize(), b"MAIL FROM:<bot@localhost> BODY=8BITMIME\r\n");

        let rcpt = Command::RcptTo {
            to: Address::new("root@localhost").unwrap(),
        };
        assert_eq!(rcpt.serialize(), b"RCPT TO:<root@localhost>\r\n");
        assert_eq!(rcpt.redacted(), "RCPT TO:<root@localhost>");
    }

    #[test]
    fn test_simple_verbs() {
        assert_eq!(Command::StartTls.serialize(), b"STARTTLS\r\n");
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(Command::Rset.serialize(), b"RSET\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }
}
