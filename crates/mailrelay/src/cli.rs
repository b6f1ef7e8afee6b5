//! Command-line options.

use std::path::PathBuf;

use structopt::StructOpt;

/// Send mail through the accounts configured for mailrelay
#[derive(StructOpt, Debug, Clone)]
#[structopt(name = "mailrelay")]
pub struct Opt {
    /// Configuration file.
    /// Defaults to mailrelay/config.json in the user config directory.
    #[structopt(short, long, global = true, parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[structopt(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[structopt(subcommand)]
    pub cmd: Command,
}

/// mailrelay subcommands
#[derive(StructOpt, Debug, Clone)]
pub enum Command {
    /// Send one plain-text mail
    Send {
        /// Recipient address
        #[structopt(short, long)]
        to: String,

        /// Subject line
        #[structopt(short, long)]
        subject: String,

        /// Message body. Read from stdin if omitted.
        #[structopt(short, long)]
        body: Option<String>,

        /// Account to send through
        #[structopt(short, long, default_value = "default")]
        account: String,
    },

    /// Send the canned test mail through the default account
    TestMail,

    /// Validate the configuration file and list any problems
    CheckConfig,

    /// Print the default configuration as JSON
    DefaultConfig,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_send() {
        let opt = Opt::from_iter_safe([
            "mailrelay", "-v", "send", "--to", "root@localhost", "--subject", "Hi", "--body",
            "Hello", "--account", "relay",
        ])
        .unwrap();

        assert!(opt.verbose);
        let Command::Send {
            to,
            subject,
            body,
            account,
        } = opt.cmd
        else {
            panic!("expected send");
        };
        assert_eq!(to, "root@localhost");
        assert_eq!(subject, "Hi");
        assert_eq!(body.as_deref(), Some("Hello"));
        assert_eq!(account, "relay");
    }

    #[test]
    fn send_defaults_to_default_account() {
        let opt =
            Opt::from_iter_safe(["mailrelay", "send", "-t", "a@b", "-s", "x"]).unwrap();
        assert!(matches!(opt.cmd, Command::Send { ref account, body: None, .. } if account == "default"));
    }

    #[test]
    fn config_after_subcommand() {
        let opt =
            Opt::from_iter_safe(["mailrelay", "check-config", "--config", "/tmp/relay.json"]).unwrap();
        assert_eq!(opt.config, Some(PathBuf::from("/tmp/relay.json")));
        assert!(matches!(opt.cmd, Command::CheckConfig));
    }

    #[test]
    fn subcommand_required() {
        assert!(Opt::from_iter_safe(["mailrelay"]).is_err());
    }
}
