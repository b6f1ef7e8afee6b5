//! ESMTP extensions advertised in the EHLO reply.

/// SMTP extension keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS - TLS upgrade
    StartTls,
    /// AUTH - Authentication
    Auth(Vec<AuthMechanism>),
    /// SIZE - Maximum message size
    Size(Option<usize>),
    /// 8BITMIME - 8-bit MIME transport
    EightBitMime,
    /// PIPELINING - Command pipelining
    Pipelining,
    /// SMTPUTF8 - UTF-8 email addresses
    SmtpUtf8,
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl Extension {
    /// Parses one extension line from an EHLO reply.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_ascii_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(parts.filter_map(AuthMechanism::parse).collect()),
            "SIZE" => Self::Size(parts.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            "SMTPUTF8" => Self::SmtpUtf8,
            // Some servers still send the pre-RFC "AUTH=" form
            upper if upper.starts_with("AUTH=") => {
                let first = &keyword[5..];
                Self::Auth(
                    std::iter::once(first)
                        .chain(parts)
                        .filter_map(AuthMechanism::parse)
                        .collect(),
                )
            }
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// SASL mechanisms the client knows how to drive, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthMechanism {
    /// PLAIN - single round trip
    Plain,
    /// LOGIN - legacy two-step username/password prompt
    Login,
}

impl AuthMechanism {
    /// Parses an authentication mechanism name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "LOGIN" => Some(Self::Login),
            _ => None,
        }
    }

    /// Returns the mechanism name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_starttls() {
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
    }

    #[test]
    fn parse_auth_ignores_unknown_mechanisms() {
        assert_eq!(
            Extension::parse("AUTH CRAM-MD5 LOGIN PLAIN XOAUTH2"),
            Extension::Auth(vec![AuthMechanism::Login, AuthMechanism::Plain])
        );
    }

    #[test]
    fn parse_legacy_auth_form() {
        assert_eq!(
            Extension::parse("AUTH=LOGIN PLAIN"),
            Extension::Auth(vec![AuthMechanism::Login, AuthMechanism::Plain])
        );
    }

    #[test]
    fn parse_size() {
        assert_eq!(Extension::parse("SIZE 52428800"), Extension::Size(Some(52_428_800)));
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert_eq!(
            Extension::parse("X-CUSTOM foo"),
            Extension::Unknown("X-CUSTOM foo".to_string())
        );
        assert!(matches!(Extension::parse(""), Extension::Unknown(_)));
    }
}
