//! Request routing: account lookup, sender rendering, message construction
//! and hand-off to a delivery backend.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::Result;
use crate::config::ConfigSource;
use crate::message::{OutgoingMessage, RequestId, SendRequest};
use crate::render::{TemplateVars, render};
use crate::reporter::report;
use crate::transport::{CommandTransport, DeliveryOutcome, Transport};
use crate::worker::{Job, WorkerPool, deliver};

/// What happened to a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Handed to the worker pool; the outcome goes to the reporter.
    Queued(RequestId),
    /// Sending is disabled; the message was only logged.
    Suppressed,
    /// Delivered inline by the delegate command. The outcome was logged
    /// here and is not passed to the reporter.
    Delivered(DeliveryOutcome),
}

/// Routes send requests to delivery backends.
///
/// Pool width and queue capacity are read from the configuration once, at
/// construction.
pub struct Dispatcher<C = CommandTransport> {
    config: Arc<dyn ConfigSource>,
    hostname: watch::Sender<Arc<str>>,
    pool: WorkerPool,
    command: Arc<C>,
}

impl<C: Transport> Dispatcher<C> {
    /// Creates a dispatcher and starts its worker pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<S: Transport>(
        config: Arc<dyn ConfigSource>,
        hostname: impl Into<String>,
        smtp: Arc<S>,
        command: Arc<C>,
        outcomes: mpsc::UnboundedSender<DeliveryOutcome>,
    ) -> Self {
        let snapshot = config.snapshot();
        let pool = WorkerPool::spawn(
            snapshot.transmitter.workers,
            snapshot.transmitter.queue_capacity,
            smtp,
            Arc::clone(&command),
            outcomes,
        );
        let hostname: Arc<str> = hostname.into().into();

        Self {
            config,
            hostname: watch::Sender::new(hostname),
            pool,
            command,
        }
    }

    /// Hostname used in templates and Message-IDs.
    #[must_use]
    pub fn hostname(&self) -> Arc<str> {
        self.hostname.borrow().clone()
    }

    /// Replaces the hostname for subsequent requests.
    pub fn set_hostname(&self, hostname: impl Into<String>) {
        let hostname: Arc<str> = hostname.into().into();
        debug!(hostname = %hostname, "Hostname updated");
        self.hostname.send_replace(hostname);
    }

    /// Dispatches one request against the current configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AccountNotFound`] if the selector matches no
    /// account, or a queue error if the worker pool cannot take the job.
    /// Delivery failures are never returned here.
    pub async fn dispatch(&self, request: SendRequest) -> Result<Dispatched> {
        let config = self.config.snapshot();
        let transmitter = &config.transmitter;
        debug!(
            request = %request.id,
            account = %request.account,
            to = %request.to_address,
            "Dispatching mail"
        );

        let account = transmitter.resolve(&request.account)?;
        debug!(request = %request.id, account = %account.name, "Account resolved");

        let hostname = self.hostname();
        let from = render(
            &account.mail_from,
            &TemplateVars {
                server: &account.server,
                hostname: &hostname,
            },
        );
        debug!(request = %request.id, from = %from, "Sender rendered");

        let message = OutgoingMessage::new(
            from,
            request.to_address.as_str(),
            request.subject.as_str(),
            request.body_text.as_str(),
        )
        .with_message_id(&hostname);
        debug!(request = %request.id, "Message built:\n{}", message.to_rfc5322());

        if !transmitter.mail_send {
            info!(
                request = %request.id,
                "Mail sending is disabled, not sending:\n{}",
                message.to_rfc5322()
            );
            return Ok(Dispatched::Suppressed);
        }

        let job = Job {
            request,
            account: account.clone(),
            message,
        };

        if job.account.use_sendmail && transmitter.delegate_inline {
            debug!(request = %job.request.id, "Running delegate inline");
            let outcome = deliver(job, Arc::clone(&self.command), Arc::clone(&self.command)).await;
            report(&outcome);
            return Ok(Dispatched::Delivered(outcome));
        }

        let id = job.request.id;
        self.pool.submit(job)?;
        Ok(Dispatched::Queued(id))
    }

    /// Stops the worker pool after queued jobs finish.
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}
