//! `mailrelay` - send mail through configured accounts from the command line.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use mailrelay_core::{ConfigStore, Dispatched, MailConfig, MailEvent, MailTransmitter, SendRequest};
use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Command, Opt};

const DEFAULT_FILTER: &str = "mailrelay=info,mailrelay_core=info,mailrelay_smtp=info";
const VERBOSE_FILTER: &str = "mailrelay=debug,mailrelay_core=debug,mailrelay_smtp=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if opt.verbose {
                    VERBOSE_FILTER.into()
                } else {
                    DEFAULT_FILTER.into()
                }
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match opt.cmd {
        Command::DefaultConfig => {
            println!("{}", MailConfig::default().to_json()?);
            Ok(())
        }
        Command::CheckConfig => check_config(&config_path(opt.config)?),
        Command::TestMail => transmit(&config_path(opt.config)?, MailEvent::TestMail).await,
        Command::Send {
            to,
            subject,
            body,
            account,
        } => {
            let body = match body {
                Some(body) => body,
                None => {
                    let mut body = String::new();
                    std::io::stdin()
                        .read_to_string(&mut body)
                        .context("Failed to read message body from stdin")?;
                    body
                }
            };
            let request = SendRequest::new(to, subject, body).with_account(account);
            transmit(&config_path(opt.config)?, MailEvent::SendMail(request)).await
        }
    }
}

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(MailConfig::default_path)
        .context("No configuration directory available; pass --config")
}

fn check_config(path: &Path) -> Result<()> {
    if !path.exists() {
        println!("{} does not exist; the defaults apply", path.display());
        return Ok(());
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = MailConfig::from_json(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    match config.validate() {
        Ok(()) => {
            let transmitter = &config.transmitter;
            println!("{}: OK", path.display());
            println!(
                "  {} outbound account(s), default '{}', sending {}",
                transmitter.accounts.len(),
                transmitter.default_account,
                if transmitter.mail_send { "enabled" } else { "disabled" }
            );
            println!(
                "  {} inbound account(s), receiving {}",
                config.receiver.accounts.len(),
                if config.receiver.mail_receive { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        Err(errors) => {
            println!("{}:", path.display());
            for error in &errors {
                println!("  {}: {error}", error.field());
            }
            bail!("{} problem(s) found", errors.len())
        }
    }
}

async fn transmit(path: &Path, event: MailEvent) -> Result<()> {
    let config = MailConfig::load_or_default(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    debug!(path = %path.display(), "Configuration loaded");

    let store = Arc::new(ConfigStore::new(config)?);
    let transmitter = MailTransmitter::start(store);

    let dispatched = transmitter.handle(event).await;
    let summary = transmitter.shutdown().await;
    info!(
        delivered = summary.delivered,
        failed = summary.failed,
        "All sends reported"
    );

    match dispatched {
        None => bail!("Mail was not sent"),
        Some(Dispatched::Suppressed) => Ok(()),
        Some(Dispatched::Delivered(outcome)) if !outcome.success() => {
            bail!("Mail delivery failed")
        }
        Some(_) if summary.failed > 0 => bail!("Mail delivery failed"),
        Some(_) => Ok(()),
    }
}
