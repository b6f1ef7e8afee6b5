//! Delivery through a local mail transfer command (`sendmail -t -oi` style).

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::{DeliveryError, DeliveryLog, DeliveryReport, Transport};
use crate::account::OutboundAccount;
use crate::message::OutgoingMessage;

/// Pipes the rendered message into the account's delegate command.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    timeout: Duration,
}

impl CommandTransport {
    /// Creates a transport that kills the command after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(
        account: &OutboundAccount,
        message: &OutgoingMessage,
        log: &mut DeliveryLog,
    ) -> Result<(), DeliveryError> {
        let binary = &account.sendmail_binary;
        let args = account.sendmail_args();
        log.step(format!("Running {binary} {}", args.join(" ")));

        let mut child = Command::new(binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DeliveryError::Process(format!("could not start {binary}: {e}")))?;

        let stdin = child.stdin.take();
        let input = message.to_local_text();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        if let Err(e) = fed {
            log.step(format!("Writing message to {binary} failed: {e}"));
        }
        let output = output.map_err(|e| DeliveryError::Process(format!("{binary}: {e}")))?;

        for (stream, bytes) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
            let text = String::from_utf8_lossy(bytes);
            for line in text.lines().filter(|line| !line.trim().is_empty()) {
                log.step(format!("{stream}: {line}"));
            }
        }

        if output.status.success() {
            log.step(format!("{binary} accepted the message"));
            Ok(())
        } else {
            Err(DeliveryError::Process(format!("{binary} exited with {}", output.status)))
        }
    }
}

impl Transport for CommandTransport {
    async fn send(&self, account: &OutboundAccount, message: &OutgoingMessage) -> DeliveryReport {
        let mut log = DeliveryLog::new();
        let result = timeout(self.timeout, Self::run(account, message, &mut log)).await;

        match result {
            Ok(Ok(())) => DeliveryReport::delivered(log),
            Ok(Err(error)) => DeliveryReport::failed(log, error),
            Err(_) => DeliveryReport::failed(log, DeliveryError::Timeout(self.timeout)),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn message() -> OutgoingMessage {
        OutgoingMessage::new("bot@localhost", "root@localhost", "Testmail", "Hello")
    }

    async fn run(binary: &str, args: &str, timeout: Duration) -> DeliveryReport {
        let account = OutboundAccount::sendmail("local", binary, args);
        CommandTransport::new(timeout).send(&account, &message()).await
    }

    #[tokio::test]
    async fn zero_exit_is_success_and_output_is_logged() {
        let report = run("cat", "", Duration::from_secs(5)).await;
        assert!(report.success(), "{}", report.log);
        assert!(report.log.mentions("stdout: Subject: Testmail"));
        assert!(report.log.mentions("stdout: Hello"));
    }

    #[tokio::test]
    async fn stdin_has_no_carriage_returns() {
        let account = OutboundAccount::sendmail("local", "od", "-c");
        let message = OutgoingMessage::new("bot@localhost", "root@localhost", "Testmail", "line1\nline2");
        let report = CommandTransport::new(Duration::from_secs(5))
            .send(&account, &message)
            .await;
        assert!(report.success(), "{}", report.log);
        assert!(report.log.mentions("\\n"));
        assert!(!report.log.mentions("\\r"), "{}", report.log);
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let report = run("false", "", Duration::from_secs(5)).await;
        assert!(matches!(report.error, Some(DeliveryError::Process(_))));
        assert!(report.log.mentions("exited with"));
    }

    #[tokio::test]
    async fn missing_binary_is_failure() {
        let report = run("/nonexistent/sendmail", "-t -oi", Duration::from_secs(5)).await;
        assert!(matches!(report.error, Some(DeliveryError::Process(ref msg)) if msg.contains("could not start")));
        assert!(report.log.mentions("Running /nonexistent/sendmail -t -oi"));
    }

    #[tokio::test]
    async fn hung_command_times_out() {
        let report = run("sleep", "10", Duration::from_millis(200)).await;
        assert!(matches!(report.error, Some(DeliveryError::Timeout(_))));
        assert!(report.log.mentions("timed out"));
    }
}
