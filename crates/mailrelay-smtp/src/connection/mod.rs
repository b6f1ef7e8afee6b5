//! SMTP session management with the type-state pattern.

mod client;
mod stream;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, SmtpConnection,
};
pub use stream::{SmtpStream, connect, connect_tls};

use crate::types::{AuthMechanism, Extension};
use std::collections::HashSet;

/// What the server told us about itself.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the greeting.
    pub hostname: String,
    /// Extensions from the last EHLO reply (empty after a HELO fallback).
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the advertised authentication mechanisms we can drive, most
    /// preferred first.
    ///
    /// Servers may advertise both `AUTH` and the legacy `AUTH=` line; every
    /// such line counts.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        let mut mechanisms: Vec<AuthMechanism> = self
            .extensions
            .iter()
            .filter_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect();
        mechanisms.sort_unstable();
        mechanisms.dedup();
        mechanisms
    }

    fn replace_extensions<'a>(&mut self, lines: impl Iterator<Item = &'a String>) {
        self.extensions = lines.map(|line| Extension::parse(line)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_from_ehlo_lines() {
        let lines = vec![
            "STARTTLS".to_string(),
            "AUTH LOGIN".to_string(),
            "8BITMIME".to_string(),
        ];
        let mut info = ServerInfo::default();
        info.replace_extensions(lines.iter());
        assert!(info.supports_starttls());
        assert!(info.supports(&Extension::EightBitMime));
        assert_eq!(info.auth_mechanisms(), vec![AuthMechanism::Login]);
    }

    #[test]
    fn auth_lines_are_merged() {
        let lines = vec![
            "AUTH LOGIN".to_string(),
            "AUTH=PLAIN LOGIN".to_string(),
            "SIZE 10240000".to_string(),
        ];
        let mut info = ServerInfo::default();
        info.replace_extensions(lines.iter());
        assert_eq!(
            info.auth_mechanisms(),
            vec![AuthMechanism::Plain, AuthMechanism::Login]
        );
    }

    #[test]
    fn no_auth_advertised() {
        let info = ServerInfo::default();
        assert!(!info.supports_starttls());
        assert!(info.auth_mechanisms().is_empty());
    }
}
