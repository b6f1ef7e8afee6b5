//! Snapshot publication for the live configuration.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::MailConfig;
use crate::{Error, Result};

/// Read access to the current configuration snapshot.
///
/// Every dispatch takes one snapshot and works against it to completion;
/// a reload never changes what an in-flight lookup sees.
pub trait ConfigSource: Send + Sync {
    /// Returns the current snapshot.
    fn snapshot(&self) -> Arc<MailConfig>;
}

/// Holds the live configuration and publishes validated replacements.
#[derive(Debug)]
pub struct ConfigStore {
    tx: watch::Sender<Arc<MailConfig>>,
}

impl ConfigStore {
    /// Creates a store seeded with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the seed does not validate.
    pub fn new(config: MailConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        let (tx, _rx) = watch::channel(Arc::new(config));
        Ok(Self { tx })
    }

    /// Replaces the live snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] and keeps the old snapshot if the
    /// new one does not validate.
    pub fn publish(&self, config: MailConfig) -> Result<()> {
        config.validate().map_err(Error::InvalidConfig)?;
        info!(
            accounts = config.transmitter.accounts.len(),
            default = %config.transmitter.default_account,
            "Publishing mail configuration"
        );
        self.tx.send_replace(Arc::new(config));
        Ok(())
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<MailConfig>> {
        self.tx.subscribe()
    }
}

impl ConfigSource for ConfigStore {
    fn snapshot(&self) -> Arc<MailConfig> {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::OutboundAccount;

    #[test]
    fn snapshot_survives_publish() {
        let store = ConfigStore::new(MailConfig::default()).unwrap();
        let before = store.snapshot();

        let mut next = MailConfig::default();
        next.transmitter
            .accounts
            .push(OutboundAccount::smtp("relay", "smtp.example.org", 587));
        next.transmitter.default_account = "relay".to_string();
        store.publish(next).unwrap();

        assert_eq!(before.transmitter.default_account, "localhost");
        assert_eq!(store.snapshot().transmitter.default_account, "relay");
    }

    #[test]
    fn invalid_publish_keeps_old_snapshot() {
        let store = ConfigStore::new(MailConfig::default()).unwrap();

        let mut broken = MailConfig::default();
        broken.transmitter.default_account = "missing".to_string();
        assert!(matches!(
            store.publish(broken),
            Err(Error::InvalidConfig(_))
        ));
        assert_eq!(store.snapshot().transmitter.default_account, "localhost");
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = ConfigStore::new(MailConfig::default()).unwrap();
        let mut rx = store.subscribe();

        let mut next = MailConfig::default();
        next.transmitter.mail_send = false;
        store.publish(next).unwrap();

        rx.changed().await.unwrap();
        assert!(!rx.borrow().transmitter.mail_send);
    }
}
