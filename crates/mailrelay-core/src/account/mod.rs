//! Account profiles for outbound and inbound mail.
//!
//! Both shapes mirror the configuration documents operators already keep:
//! boolean `ssl`/`tls` flags, an optional username/password pair and an
//! optional local delegate command.

mod model;
mod validation;

pub use model::{
    Credentials, InboundAccount, InboundProtocol, OutboundAccount, OutboundProtocol, Security,
};
pub use validation::{
    ValidationError, ValidationResult, validate_inbound_accounts, validate_outbound_accounts,
};
