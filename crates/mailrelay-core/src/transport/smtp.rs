//! Direct SMTP delivery.

use std::time::Duration;

use mailrelay_smtp::connection::{connect, connect_tls};
use mailrelay_smtp::{Client, SmtpConnection};
use tokio::time::timeout;
use tracing::warn;

use super::{DeliveryError, DeliveryLog, DeliveryReport, Transport};
use crate::account::{OutboundAccount, Security};
use crate::message::OutgoingMessage;

/// Sends through a fresh SMTP session per message.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    timeout: Duration,
    client_hostname: String,
}

impl SmtpTransport {
    /// Creates a transport that greets servers as `client_hostname` and
    /// gives each attempt `timeout` to finish.
    #[must_use]
    pub fn new(timeout: Duration, client_hostname: impl Into<String>) -> Self {
        Self {
            timeout,
            client_hostname: client_hostname.into(),
        }
    }

    async fn session(
        &self,
        account: &OutboundAccount,
        message: &OutgoingMessage,
        log: &mut DeliveryLog,
    ) -> Result<(), DeliveryError> {
        let (from, to) = message.envelope()?;
        let security = account.security();

        log.step(format!(
            "Connecting to {}:{} ({})",
            account.server,
            account.port,
            security.display_name()
        ));
        let stream = match security {
            Security::Ssl => connect_tls(&account.server, account.port).await?,
            Security::StartTls | Security::None => connect(&account.server, account.port).await?,
        };

        let client = Client::from_stream(stream).await?;
        log.step(format!("Connected to {}", client.server_info().hostname));

        let mut client = client.ehlo(&self.client_hostname).await?;
        if security == Security::StartTls {
            log.step("Starting TLS");
            client = client.starttls(&account.server).await?;
        }

        let client = match account.credentials() {
            Some(credentials) => {
                log.step(format!("Logging in with {}", credentials.username));
                client
                    .authenticate(&credentials.username, &credentials.password)
                    .await?
                    .mail_from(from)
                    .await?
            }
            None => {
                log.step("No username, trying anonymous access");
                client.mail_from(from).await?
            }
        };

        log.step("Sending Mail");
        let client = client.rcpt_to(to).await?.data().await?;
        let (client, reply) = client
            .send_message(message.to_rfc5322().as_bytes())
            .await?;
        log.step(format!("Server response: {reply}"));

        // The message is already accepted at this point.
        if let Err(e) = client.quit().await {
            warn!(server = %account.server, error = %e, "QUIT failed after delivery");
            log.step(format!("QUIT failed: {e}"));
        }

        Ok(())
    }
}

impl Transport for SmtpTransport {
    async fn send(&self, account: &OutboundAccount, message: &OutgoingMessage) -> DeliveryReport {
        let mut log = DeliveryLog::new();
        let result = timeout(self.timeout, self.session(account, message, &mut log)).await;

        match result {
            Ok(Ok(())) => DeliveryReport::delivered(log),
            Ok(Err(error)) => DeliveryReport::failed(log, error),
            Err(_) => DeliveryReport::failed(log, DeliveryError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn refused_connection_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let account = OutboundAccount::smtp("local", "127.0.0.1", port);
        let message = OutgoingMessage::new("bot@localhost", "root@localhost", "s", "b");
        let report = SmtpTransport::new(Duration::from_secs(5), "relay.test")
            .send(&account, &message)
            .await;

        assert!(matches!(report.error, Some(DeliveryError::Connection(_))));
        assert_eq!(report.log.lines()[0], format!("Connecting to 127.0.0.1:{port} (None (insecure))"));
    }

    #[tokio::test]
    async fn bad_sender_fails_before_connecting() {
        let account = OutboundAccount::smtp("local", "127.0.0.1", 1);
        let message = OutgoingMessage::new("bot@", "root@localhost", "s", "b");
        let report = SmtpTransport::new(Duration::from_secs(5), "relay.test")
            .send(&account, &message)
            .await;

        assert!(matches!(report.error, Some(DeliveryError::Address(_))));
        assert_eq!(report.log.lines().len(), 1);
    }
}
