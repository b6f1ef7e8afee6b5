//! Fixed-width delivery worker pool.
//!
//! Jobs enter through a bounded queue. A single intake task waits for one
//! of `workers` permits, then pulls the next job off and starts it. Every
//! accepted job yields exactly one [`DeliveryOutcome`] on the outcome
//! channel, even if its transport panics.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error};

use crate::account::OutboundAccount;
use crate::message::{OutgoingMessage, SendRequest};
use crate::transport::{DeliveryError, DeliveryLog, DeliveryOutcome, DeliveryReport, Transport};
use crate::{Error, Result};

/// One unit of delivery work.
#[derive(Debug, Clone)]
pub struct Job {
    /// The originating request.
    pub request: SendRequest,
    /// Account snapshot to deliver through.
    pub account: OutboundAccount,
    /// The constructed message.
    pub message: OutgoingMessage,
}

/// Runs a job on whichever transport its account selects.
///
/// The attempt runs on its own task so a panicking transport still yields
/// an outcome.
pub(crate) async fn deliver<S, C>(job: Job, smtp: Arc<S>, command: Arc<C>) -> DeliveryOutcome
where
    S: Transport,
    C: Transport,
{
    let Job {
        request,
        account,
        message,
    } = job;
    let account_name = account.name.clone();

    let attempt = tokio::spawn(async move {
        if account.use_sendmail {
            command.send(&account, &message).await
        } else {
            smtp.send(&account, &message).await
        }
    });

    let report = match attempt.await {
        Ok(report) => report,
        Err(e) => {
            error!(request = %request.id, error = %e, "Delivery task failed");
            DeliveryReport::failed(DeliveryLog::new(), DeliveryError::Aborted(e.to_string()))
        }
    };

    DeliveryOutcome::new(request, account_name, report)
}

/// Handle to the worker pool.
#[derive(Debug)]
pub struct WorkerPool {
    tx: mpsc::Sender<Job>,
    capacity: usize,
    intake: JoinHandle<()>,
}

impl WorkerPool {
    /// Starts `workers` delivery slots behind a queue of `capacity` jobs.
    ///
    /// Both values are clamped to at least one.
    #[must_use]
    pub fn spawn<S, C>(
        workers: usize,
        capacity: usize,
        smtp: Arc<S>,
        command: Arc<C>,
        outcomes: mpsc::UnboundedSender<DeliveryOutcome>,
    ) -> Self
    where
        S: Transport,
        C: Transport,
    {
        let workers = workers.max(1);
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        debug!(workers, capacity, "Starting delivery workers");
        let intake = tokio::spawn(intake(rx, workers, smtp, command, outcomes));

        Self {
            tx,
            capacity,
            intake,
        }
    }

    /// Queues a job without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueFull`] if the queue is at capacity, or
    /// [`Error::PoolClosed`] if the pool has stopped.
    pub fn submit(&self, job: Job) -> Result<()> {
        let id = job.request.id;
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::QueueFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => Error::PoolClosed,
        })?;
        debug!(request = %id, "Queued for delivery");
        Ok(())
    }

    /// Stops accepting jobs and waits for queued and running ones to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.intake.await {
            error!(error = %e, "Delivery worker intake failed");
        }
    }
}

async fn intake<S, C>(
    mut rx: mpsc::Receiver<Job>,
    workers: usize,
    smtp: Arc<S>,
    command: Arc<C>,
    outcomes: mpsc::UnboundedSender<DeliveryOutcome>,
) where
    S: Transport,
    C: Transport,
{
    let permits = Arc::new(Semaphore::new(workers));
    let mut running = JoinSet::new();

    // A job leaves the queue only once a slot is free, so the queue alone
    // holds the backlog.
    loop {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let Some(job) = rx.recv().await else {
            break;
        };
        while running.try_join_next().is_some() {}

        let smtp = Arc::clone(&smtp);
        let command = Arc::clone(&command);
        let outcomes = outcomes.clone();
        running.spawn(async move {
            let outcome = deliver(job, smtp, command).await;
            if outcomes.send(outcome).is_err() {
                debug!("Outcome dropped, reporter has stopped");
            }
            drop(permit);
        });
    }

    while running.join_next().await.is_some() {}
    debug!("Delivery workers stopped");
}
