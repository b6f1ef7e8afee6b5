//! Plain and TLS transport for an SMTP session.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::trace;

/// Longest reply line accepted before the session is considered broken.
const MAX_LINE_LEN: usize = 4096;

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Returns true once the session runs over TLS.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one reply line with the trailing CRLF removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] on EOF, or an I/O error.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
        };

        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        if line.len() > MAX_LINE_LEN {
            return Err(Error::Protocol(format!(
                "Reply line exceeds {MAX_LINE_LEN} bytes"
            )));
        }

        let line = line.trim_end_matches(['\r', '\n']).to_string();
        trace!(line = %line, "S:");
        Ok(line)
    }

    /// Writes and flushes data.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a TCP stream to TLS (after a successful `STARTTLS`).
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let reader = match self {
            Self::Tcp(reader) => reader,
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };

        // Unread server bytes here would be a STARTTLS injection attempt
        if !reader.buffer().is_empty() {
            return Err(Error::Protocol(
                "Server sent data before TLS handshake".into(),
            ));
        }

        let tls_stream = handshake(hostname, reader.into_inner()).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let stream = TcpStream::connect((hostname, port)).await?;
    Ok(SmtpStream::Tcp(BufReader::new(stream)))
}

/// Connects to an SMTP server with implicit TLS (SMTPS, usually port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    let tcp_stream = TcpStream::connect((hostname, port)).await?;
    let tls_stream = handshake(hostname, tcp_stream).await?;
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls_stream))))
}

async fn handshake(
    hostname: &str,
    tcp_stream: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

    Ok(tls_connector().connect(server_name, tcp_stream).await?)
}

/// Shared TLS connector trusting the bundled web PKI roots.
fn tls_connector() -> TlsConnector {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

    let config = CONFIG.get_or_init(|| {
        let root_store = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };

        Arc::new(
            ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        )
    });

    TlsConnector::from(Arc::clone(config))
}
