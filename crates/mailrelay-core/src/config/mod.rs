//! Mail configuration documents.
//!
//! The on-disk shape is JSON with a `transmitter` and a `receiver` section,
//! each holding its toggle and an array of account objects. Every field has
//! a default, so a partial document (or none at all) yields a working
//! local setup.

mod store;

pub use store::{ConfigSource, ConfigStore};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::{
    InboundAccount, OutboundAccount, ValidationError, ValidationResult, validate_inbound_accounts,
    validate_outbound_accounts,
};
use crate::message::AccountSelector;
use crate::{Error, Result};

/// Outbound settings: send toggle, default route and the account registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmitterConfig {
    /// Generally toggle email sending (off keeps messages in the log only).
    pub mail_send: bool,
    /// Account used for the `default` selector.
    pub default_account: String,
    /// Outbound account registry, in configuration order.
    pub accounts: Vec<OutboundAccount>,
    /// Concurrent delivery workers.
    pub workers: usize,
    /// Sends that may wait for a worker before new ones are refused.
    pub queue_capacity: usize,
    /// Ceiling for one SMTP attempt, in seconds.
    pub send_timeout_secs: u64,
    /// Ceiling for one delegate command run, in seconds.
    pub delegate_timeout_secs: u64,
    /// Run delegate commands on the dispatching task instead of a worker.
    pub delegate_inline: bool,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            mail_send: true,
            default_account: "localhost".to_string(),
            accounts: vec![OutboundAccount::localhost()],
            workers: 2,
            queue_capacity: 64,
            send_timeout_secs: 30,
            delegate_timeout_secs: 30,
            delegate_inline: false,
        }
    }
}

impl TransmitterConfig {
    /// Looks up an account by exact name.
    #[must_use]
    pub fn account(&self, name: &str) -> Option<&OutboundAccount> {
        self.accounts.iter().find(|account| account.name == name)
    }

    /// Resolves a selector, substituting `default_account` for `default`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if no account carries the name.
    pub fn resolve(&self, selector: &AccountSelector) -> Result<&OutboundAccount> {
        let name = match selector {
            AccountSelector::Default => self.default_account.as_str(),
            AccountSelector::Named(name) => name.as_str(),
        };
        self.account(name)
            .ok_or_else(|| Error::AccountNotFound(name.to_string()))
    }

    /// Timeout for one direct SMTP attempt.
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Timeout for one delegate command run.
    #[must_use]
    pub const fn delegate_timeout(&self) -> Duration {
        Duration::from_secs(self.delegate_timeout_secs)
    }

    /// Validate the registry and pool settings.
    ///
    /// # Errors
    ///
    /// Returns every validation error found.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = validate_outbound_accounts(&self.accounts, &self.default_account)
            .err()
            .unwrap_or_default();

        for (field, value) in [
            ("workers", self.workers as u64),
            ("queue_capacity", self.queue_capacity as u64),
            ("send_timeout_secs", self.send_timeout_secs),
            ("delegate_timeout_secs", self.delegate_timeout_secs),
        ] {
            if value == 0 {
                errors.push(ValidationError::ZeroSetting(field));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Inbound settings: poll toggle and the account registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Poll configured accounts for new mail.
    pub mail_receive: bool,
    /// Inbound account registry.
    pub accounts: Vec<InboundAccount>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            mail_receive: true,
            accounts: vec![InboundAccount::localhost()],
        }
    }
}

/// Complete mail configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Outbound section.
    pub transmitter: TransmitterConfig,
    /// Inbound section.
    pub receiver: ReceiverConfig,
}

impl MailConfig {
    /// Default config file location (`<config dir>/mailrelay/config.json`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mailrelay").join("config.json"))
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has wrong field types.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading mail configuration");
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(config)
    }

    /// Loads a config file, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read, parsed or validated.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No mail configuration found, using defaults");
            Ok(Self::default())
        }
    }

    /// Writes the config as JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Validate both sections.
    ///
    /// # Errors
    ///
    /// Returns every validation error found.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = self.transmitter.validate().err().unwrap_or_default();
        errors.extend(
            validate_inbound_accounts(&self.receiver.accounts)
                .err()
                .unwrap_or_default(),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
