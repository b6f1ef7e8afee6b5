//! Envelope addresses.

use crate::error::{Error, Result};

/// Bare address used in `MAIL FROM` / `RCPT TO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty, lacks a single `@`, or
    /// contains characters that would break the envelope command line.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "Address contains forbidden characters: {addr}"
            )));
        }

        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress(format!("Address must contain @: {addr}")));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "Local and domain parts cannot be empty: {addr}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Header mailbox: optional display name plus address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Parses a header value such as `Bot <bot@example.org>` or a bare
    /// `bot@example.org`.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid address can be extracted.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();

        let Some(open) = value.rfind('<') else {
            return Self::new(value);
        };

        let close = value[open..]
            .find('>')
            .map(|i| open + i)
            .ok_or_else(|| Error::InvalidAddress(format!("Unclosed angle bracket: {value}")))?;

        let name = value[..open].trim().trim_matches('"').trim();
        Ok(Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            address: Address::new(value[open + 1..close].trim())?,
        })
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new("root@localhost").unwrap();
        assert_eq!(addr.as_str(), "root@localhost");
        assert_eq!(addr.domain(), "localhost");
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Address::new("").is_err());
        assert!(Address::new("rootlocalhost").is_err());
        assert!(Address::new("@localhost").is_err());
        assert!(Address::new("root@").is_err());
        assert!(Address::new("root @localhost").is_err());
        assert!(Address::new("root@localhost>\r\nRCPT TO:<x@y").is_err());
    }

    #[test]
    fn test_parse_bare_mailbox() {
        let mailbox = Mailbox::parse("  bot@mail.example.org ").unwrap();
        assert!(mailbox.name.is_none());
        assert_eq!(mailbox.address.as_str(), "bot@mail.example.org");
    }

    #[test]
    fn test_parse_named_mailbox() {
        let mailbox = Mailbox::parse("\"Relay Bot\" <bot@mail.example.org>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Relay Bot"));
        assert_eq!(mailbox.address.as_str(), "bot@mail.example.org");
        assert_eq!(mailbox.to_string(), "Relay Bot <bot@mail.example.org>");
    }

    #[test]
    fn test_parse_angle_only() {
        let mailbox = Mailbox::parse("<bot@host>").unwrap();
        assert!(mailbox.name.is_none());
        assert_eq!(mailbox.address.as_str(), "bot@host");
    }

    #[test]
    fn test_parse_unclosed() {
        assert!(Mailbox::parse("Bot <bot@host").is_err());
    }
}
