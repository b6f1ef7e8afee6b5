//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::marker::PhantomData;
use tracing::debug;

/// Upper bound on lines in one reply; guards against a server streaming forever.
const MAX_REPLY_LINES: usize = 256;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    client_hostname: String,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns true if the session is encrypted.
    fn is_encrypted(&self) -> bool;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn is_encrypted(&self) -> bool {
        self.stream.is_encrypted()
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server refuses service.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::rejected(&greeting));
        }

        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        debug!(server = %hostname, "SMTP greeting received");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: std::collections::HashSet::new(),
            },
            client_hostname: "localhost".to_string(),
            _state: PhantomData,
        })
    }

    /// Greets the server with EHLO, falling back to HELO when the server
    /// does not speak ESMTP.
    ///
    /// # Errors
    ///
    /// Returns an error if both greetings are rejected.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        self.client_hostname = client_hostname.to_string();

        let reply = self
            .send_command(Command::Ehlo {
                hostname: self.client_hostname.clone(),
            })
            .await?;

        if reply.is_success() {
            self.server_info.replace_extensions(reply.message.iter().skip(1));
            return Ok(self);
        }

        if !reply.code.is_permanent() {
            return Err(Error::rejected(&reply));
        }

        debug!(code = %reply.code, "EHLO refused, retrying with HELO");
        let reply = self
            .send_command(Command::Helo {
                hostname: self.client_hostname.clone(),
            })
            .await?;

        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        self.server_info.extensions.clear();
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS and greets again.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not offered or the upgrade fails.
    pub async fn starttls(mut self, server_hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.send_command(Command::StartTls).await?;
        if reply.code != ReplyCode::SERVICE_READY {
            return Err(Error::rejected(&reply));
        }

        self.stream = self.stream.upgrade_to_tls(server_hostname).await?;

        // RFC 3207: capabilities learned before the upgrade must be discarded
        self.server_info.extensions.clear();
        let client_hostname = self.client_hostname.clone();
        self.ehlo(&client_hostname).await
    }

    /// Authenticates with the best mechanism the server advertises.
    ///
    /// PLAIN is preferred; LOGIN is used when it is the only option. If the
    /// server advertises nothing usable, PLAIN is attempted anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let mechanisms = self.server_info.auth_mechanisms();
        if !mechanisms.contains(&AuthMechanism::Plain) && mechanisms.contains(&AuthMechanism::Login)
        {
            self.auth_login(username, password).await
        } else {
            self.auth_plain(username, password).await
        }
    }

    /// Authenticates using the PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let credentials = format!("\0{username}\0{password}");
        let reply = self
            .send_command(Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: Some(BASE64.encode(credentials.as_bytes())),
            })
            .await?;

        if !reply.is_success() {
            return Err(Error::auth_failed(&reply));
        }

        Ok(self.transition())
    }

    /// Authenticates using the LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not prompt as expected or
    /// rejects the credentials.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let steps = [
            Command::Auth {
                mechanism: AuthMechanism::Login,
                initial_response: None,
            },
            Command::AuthResponse(BASE64.encode(username.as_bytes())),
        ];

        for step in steps {
            let reply = self.send_command(step).await?;
            if reply.code != ReplyCode::AUTH_CONTINUE {
                return Err(Error::auth_failed(&reply));
            }
        }

        let reply = self
            .send_command(Command::AuthResponse(BASE64.encode(password.as_bytes())))
            .await?;
        if !reply.is_success() {
            return Err(Error::auth_failed(&reply));
        }

        Ok(self.transition())
    }

    /// Starts an anonymous mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(self, from: Address) -> Result<Client<MailTransaction>> {
        self.start_transaction(from).await
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(self, from: Address) -> Result<Client<MailTransaction>> {
        self.start_transaction(from).await
    }
}

impl Client<MailTransaction> {
    /// Adds a recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.expect_success(Command::RcptTo { to }).await?;
        Ok(self.transition())
    }

    /// Aborts the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<Connected>> {
        self.expect_success(Command::Rset).await?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        self.expect_success(Command::RcptTo { to }).await?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.send_command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(Error::rejected(&reply));
        }
        Ok(self.transition())
    }

    /// Aborts the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<Connected>> {
        self.expect_success(Command::Rset).await?;
        Ok(self.transition())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, leading dots are stuffed and the
    /// terminating `.` line is appended. Returns the server's acceptance
    /// reply alongside the client.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the server rejects the message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<(Client<Connected>, Reply)> {
        self.stream.write_all(&encode_data(message)).await?;

        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        Ok((self.transition(), reply))
    }
}

// Common implementation for all states
impl<S> Client<S> {
    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        debug!(command = %cmd.redacted(), "C:");
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    async fn expect_success(&mut self, cmd: Command) -> Result<Reply> {
        let reply = self.send_command(cmd).await?;
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(Error::rejected(&reply))
        }
    }

    async fn start_transaction(mut self, from: Address) -> Result<Client<MailTransaction>> {
        let body = self
            .server_info
            .supports(&Extension::EightBitMime)
            .then_some("8BITMIME");
        self.expect_success(Command::MailFrom { from, body }).await?;
        Ok(self.transition())
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            client_hostname: self.client_hostname,
            _state: PhantomData,
        }
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command is rejected.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::rejected(&reply));
        }

        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
        if lines.len() >= MAX_REPLY_LINES {
            return Err(Error::Protocol("Reply has too many lines".into()));
        }
    }

    parse_reply(&lines)
}

/// Normalizes line endings to CRLF, dot-stuffs and terminates message data.
fn encode_data(message: &[u8]) -> Vec<u8> {
    let message = message.strip_suffix(b"\n").unwrap_or(message);
    let message = message.strip_suffix(b"\r").unwrap_or(message);

    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);
    for line in message.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}
