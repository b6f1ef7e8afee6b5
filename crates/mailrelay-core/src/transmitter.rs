//! The mail transmitter component: event handling on top of the dispatcher.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::{ConfigSource, ConfigStore};
use crate::dispatcher::{Dispatched, Dispatcher};
use crate::identity::system_hostname;
use crate::message::SendRequest;
use crate::reporter::{ReportSummary, ResultReporter};
use crate::transport::{CommandTransport, SmtpTransport, Transport};
use crate::{Error, Result};

/// Name of the command action that sends the canned test mail.
pub const TEST_MAIL_ACTION: &str = "test_mail";

/// Events the transmitter reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailEvent {
    /// Send the given request.
    SendMail(SendRequest),
    /// Send the canned test mail through the default account.
    TestMail,
}

/// Owns the dispatcher and the result reporter.
pub struct MailTransmitter<C = CommandTransport> {
    dispatcher: Dispatcher<C>,
    reporter: JoinHandle<ReportSummary>,
}

impl MailTransmitter {
    /// Starts the transmitter with the real SMTP and command transports.
    ///
    /// The system hostname is looked up once here.
    #[must_use]
    pub fn start(store: Arc<ConfigStore>) -> Self {
        let hostname = system_hostname();
        let snapshot = store.snapshot();
        let transmitter = &snapshot.transmitter;

        let smtp = SmtpTransport::new(transmitter.send_timeout(), hostname.as_str());
        let command = CommandTransport::new(transmitter.delegate_timeout());

        info!(
            hostname = %hostname,
            accounts = transmitter.accounts.len(),
            default = %transmitter.default_account,
            "Mail transmitter started"
        );
        Self::with_transports(store, hostname, smtp, command)
    }
}

impl<C: Transport> MailTransmitter<C> {
    /// Starts the transmitter with the given transports.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_transports<S: Transport>(
        config: Arc<dyn ConfigSource>,
        hostname: impl Into<String>,
        smtp: S,
        command: C,
    ) -> Self {
        let (outcomes, reporter) = ResultReporter::channel();
        let dispatcher = Dispatcher::new(
            config,
            hostname,
            Arc::new(smtp),
            Arc::new(command),
            outcomes,
        );

        Self {
            dispatcher,
            reporter: reporter.spawn(),
        }
    }

    /// Handles one event. Failures are logged, never returned.
    pub async fn handle(&self, event: MailEvent) -> Option<Dispatched> {
        let request = match event {
            MailEvent::SendMail(request) => request,
            MailEvent::TestMail => SendRequest::test_mail(),
        };
        let id = request.id;
        let to = request.to_address.clone();

        match self.dispatcher.dispatch(request).await {
            Ok(dispatched) => Some(dispatched),
            Err(e) => {
                error!(request = %id, to = %to, error = %e, "Mail not sent");
                None
            }
        }
    }

    /// Names of the command actions this component registers.
    #[must_use]
    pub const fn actions() -> &'static [&'static str] {
        &[TEST_MAIL_ACTION]
    }

    /// Runs a named command action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if no action carries the name.
    pub async fn invoke(&self, action: &str) -> Result<Option<Dispatched>> {
        match action {
            TEST_MAIL_ACTION => Ok(self.handle(MailEvent::TestMail).await),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }

    /// Replaces the hostname used for templates and Message-IDs.
    pub fn set_hostname(&self, hostname: impl Into<String>) {
        self.dispatcher.set_hostname(hostname);
    }

    /// Waits for every queued request to be reported, then stops.
    ///
    /// The summary counts pool deliveries; inline delegate results are
    /// logged by the dispatcher and returned from [`Self::handle`].
    pub async fn shutdown(self) -> ReportSummary {
        self.dispatcher.shutdown().await;
        match self.reporter.await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Result reporter failed");
                ReportSummary::default()
            }
        }
    }
}
