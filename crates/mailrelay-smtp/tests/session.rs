//! Session tests against a scripted in-process SMTP server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mailrelay_smtp::connection::connect;
use mailrelay_smtp::{Address, Client, Error, SmtpConnection};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One scripted exchange: the command prefix we expect, and what to answer.
type Step = (&'static str, &'static str);

/// Starts a server that greets, then plays `steps` in order.
///
/// A step whose prefix is `"<DATA>"` swallows message lines up to the lone
/// `.` and records them. Returns the port and a handle yielding every line
/// the client sent.
async fn scripted_server(steps: Vec<Step>) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut seen = Vec::new();

        write.write_all(b"220 mx.test ESMTP ready\r\n").await.unwrap();

        for (expect, answer) in steps {
            if expect == "<DATA>" {
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).await.unwrap();
                    let line = line.trim_end_matches(['\r', '\n']).to_string();
                    let done = line == ".";
                    seen.push(line);
                    if done {
                        break;
                    }
                }
            } else {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                assert!(line.starts_with(expect), "expected {expect:?}, got {line:?}");
                seen.push(line);
            }
            write.write_all(answer.as_bytes()).await.unwrap();
        }

        seen
    });

    (port, handle)
}

#[tokio::test]
async fn anonymous_submission() {
    let (port, server) = scripted_server(vec![
        ("EHLO relay.test", "250-mx.test\r\n250 8BITMIME\r\n"),
        ("MAIL FROM:<bot@localhost> BODY=8BITMIME", "250 OK\r\n"),
        ("RCPT TO:<root@localhost>", "250 OK\r\n"),
        ("DATA", "354 Go ahead\r\n"),
        ("<DATA>", "250 2.0.0 Ok: queued as ABC123\r\n"),
        ("QUIT", "221 Bye\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream).await.unwrap();
    assert_eq!(client.server_info().hostname, "mx.test");

    let client = client.ehlo("relay.test").await.unwrap();
    assert!(!client.is_encrypted());

    let client = client
        .mail_from(Address::new("bot@localhost").unwrap())
        .await
        .unwrap()
        .rcpt_to(Address::new("root@localhost").unwrap())
        .await
        .unwrap()
        .data()
        .await
        .unwrap();

    let (client, reply) = client
        .send_message(b"Subject: Testmail\n\n.hidden dot\nbye\n")
        .await
        .unwrap();
    assert_eq!(reply.message_text(), "2.0.0 Ok: queued as ABC123");
    client.quit().await.unwrap();

    let seen = server.await.unwrap();
    assert!(seen.contains(&"..hidden dot".to_string()));
    assert_eq!(seen.last().map(String::as_str), Some("QUIT"));
}

#[tokio::test]
async fn login_mechanism_when_plain_missing() {
    let (port, server) = scripted_server(vec![
        ("EHLO", "250-mx.test\r\n250 AUTH LOGIN\r\n"),
        ("AUTH LOGIN", "334 VXNlcm5hbWU6\r\n"),
        ("dXNlcg==", "334 UGFzc3dvcmQ6\r\n"),
        ("c2VjcmV0", "235 Authenticated\r\n"),
        ("MAIL FROM:<user@mx.test>", "250 OK\r\n"),
        ("QUIT", "221 Bye\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("relay.test")
        .await
        .unwrap()
        .authenticate("user", "secret")
        .await
        .unwrap();

    let client = client
        .mail_from(Address::new("user@mx.test").unwrap())
        .await
        .unwrap();
    client.quit().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn rejected_credentials() {
    let (port, server) = scripted_server(vec![
        ("EHLO", "250-mx.test\r\n250 AUTH PLAIN LOGIN\r\n"),
        ("AUTH PLAIN", "535 5.7.8 Authentication credentials invalid\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("relay.test")
        .await
        .unwrap();

    let err = client.authenticate("user", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed { code: 535, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn helo_fallback() {
    let (port, server) = scripted_server(vec![
        ("EHLO", "502 Command not implemented\r\n"),
        ("HELO relay.test", "250 mx.test\r\n"),
        ("QUIT", "221 Bye\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("relay.test")
        .await
        .unwrap();
    assert!(client.server_info().extensions.is_empty());
    client.quit().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn starttls_requires_advertisement() {
    let (port, server) = scripted_server(vec![("EHLO", "250 mx.test\r\n")]).await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("relay.test")
        .await
        .unwrap();

    let err = client.starttls("mx.test").await.unwrap_err();
    assert!(matches!(err, Error::NotSupported(ref ext) if ext == "STARTTLS"));
    server.await.unwrap();
}

#[tokio::test]
async fn recipient_refused() {
    let (port, server) = scripted_server(vec![
        ("EHLO", "250 mx.test\r\n"),
        ("MAIL FROM", "250 OK\r\n"),
        ("RCPT TO", "550 5.1.1 No such user\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("relay.test")
        .await
        .unwrap()
        .mail_from(Address::new("bot@localhost").unwrap())
        .await
        .unwrap();

    let err = client
        .rcpt_to(Address::new("ghost@localhost").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_permanent());
    assert_eq!(err.to_string(), "SMTP error 550: 5.1.1 No such user");
    server.await.unwrap();
}

#[tokio::test]
async fn server_hangs_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        drop(socket);
    });

    let stream = connect("127.0.0.1", port).await.unwrap();
    let err = Client::from_stream(stream).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed | Error::Io(_)));
    server.await.unwrap();
}
