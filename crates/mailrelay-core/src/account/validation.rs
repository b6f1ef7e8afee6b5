//! Account registry validation.

use std::collections::HashSet;

use super::model::{InboundAccount, OutboundAccount};

/// Validation error for account configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account name is empty.
    EmptyName,
    /// Two accounts share a name.
    DuplicateName(String),
    /// The default account is not in the registry.
    UnknownDefault(String),
    /// Direct-session account has no server.
    EmptyServer(String),
    /// Direct-session account has port 0.
    InvalidPort(String),
    /// Sender template is empty.
    EmptyFrom(String),
    /// Delegating account has no command configured.
    EmptyCommand(String),
    /// A pool setting is zero.
    ZeroSetting(&'static str),
}

impl ValidationError {
    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::DuplicateName(_) => "name",
            Self::UnknownDefault(_) => "default_account",
            Self::EmptyServer(_) => "server",
            Self::InvalidPort(_) => "port",
            Self::EmptyFrom(_) => "mail_from",
            Self::EmptyCommand(_) => "sendmail_binary",
            Self::ZeroSetting(field) => *field,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name is required"),
            Self::DuplicateName(name) => write!(f, "Account name '{name}' is used more than once"),
            Self::UnknownDefault(name) => write!(f, "Default account '{name}' is not configured"),
            Self::EmptyServer(name) => write!(f, "Account '{name}': mail server is required"),
            Self::InvalidPort(name) => write!(f, "Account '{name}': port must be 1-65535"),
            Self::EmptyFrom(name) => write!(f, "Account '{name}': sender address is required"),
            Self::EmptyCommand(name) => write!(f, "Account '{name}': delegate command is required"),
            Self::ZeroSetting(field) => write!(f, "{field} must be greater than zero"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a registry.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate the outbound registry and its default account.
///
/// Returns every problem found, not just the first.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any account is invalid.
pub fn validate_outbound_accounts(
    accounts: &[OutboundAccount],
    default_account: &str,
) -> ValidationResult {
    let mut errors = check_names(accounts.iter().map(|a| a.name.as_str()));

    for account in accounts {
        let name = &account.name;

        if account.mail_from.trim().is_empty() {
            errors.push(ValidationError::EmptyFrom(name.clone()));
        }

        if account.use_sendmail {
            if account.sendmail_binary.trim().is_empty() {
                errors.push(ValidationError::EmptyCommand(name.clone()));
            }
        } else {
            if account.server.trim().is_empty() {
                errors.push(ValidationError::EmptyServer(name.clone()));
            }
            if account.port == 0 {
                errors.push(ValidationError::InvalidPort(name.clone()));
            }
        }
    }

    if !accounts.iter().any(|a| a.name == default_account) {
        errors.push(ValidationError::UnknownDefault(default_account.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the inbound registry.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any account is invalid.
pub fn validate_inbound_accounts(accounts: &[InboundAccount]) -> ValidationResult {
    let mut errors = check_names(accounts.iter().map(|a| a.name.as_str()));

    for account in accounts {
        let name = &account.name;
        if account.use_fetchmail {
            if account.fetchmail_binary.trim().is_empty() {
                errors.push(ValidationError::EmptyCommand(name.clone()));
            }
        } else {
            if account.server.trim().is_empty() {
                errors.push(ValidationError::EmptyServer(name.clone()));
            }
            if account.port == 0 {
                errors.push(ValidationError::InvalidPort(name.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for name in names {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateName(name.to_string()));
        }
    }

    errors
}
