//! Delivery outcome reporting.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::transport::DeliveryOutcome;

/// Logs a single outcome.
pub fn report(outcome: &DeliveryOutcome) {
    let request = &outcome.request;
    match &outcome.error {
        None => {
            info!(
                request = %request.id,
                account = %outcome.account,
                to = %request.to_address,
                "Mail sent"
            );
            debug!(request = %request.id, "Delivery log:\n{}", outcome.log);
        }
        Some(e) => {
            error!(
                request = %request.id,
                account = %outcome.account,
                to = %request.to_address,
                subject = %request.subject,
                error = %e,
                "Sending mail failed:\n{}",
                outcome.log
            );
        }
    }
}

/// Counts of reported outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    /// Successful deliveries.
    pub delivered: usize,
    /// Failed deliveries.
    pub failed: usize,
}

/// Consumes outcomes until every sender is gone.
#[derive(Debug)]
pub struct ResultReporter {
    rx: mpsc::UnboundedReceiver<DeliveryOutcome>,
}

impl ResultReporter {
    /// Creates a reporter and the sender feeding it.
    #[must_use]
    pub fn channel() -> (mpsc::UnboundedSender<DeliveryOutcome>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Reports outcomes as they arrive.
    pub async fn run(mut self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        while let Some(outcome) = self.rx.recv().await {
            report(&outcome);
            if outcome.success() {
                summary.delivered += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    /// Runs the reporter on its own task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<ReportSummary> {
        tokio::spawn(self.run())
    }
}
