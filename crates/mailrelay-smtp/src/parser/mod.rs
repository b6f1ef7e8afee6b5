//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from its response lines (CRLF already stripped).
///
/// Multi-line replies use `-` after the code on every line but the last:
/// `250-mx.example.org`, `250-STARTTLS`, `250 SIZE 1000`.
///
/// # Errors
///
/// Returns an error if a line is malformed or the codes disagree.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Protocol("Empty reply".into()));
    };

    let code = parse_code(first)?;
    let mut message = Vec::with_capacity(lines.len());

    for line in lines {
        if parse_code(line)? != code {
            return Err(Error::Protocol(format!(
                "Reply code changed mid-reply: {line}"
            )));
        }
        // Skip code and separator ("250-" / "250 ")
        message.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(ReplyCode::new(code), message))
}

fn parse_code(line: &str) -> Result<u16> {
    let code = line
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {line}")))?;

    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!("Invalid reply code: {line}")));
    }

    match line.as_bytes().get(3) {
        None | Some(b' ' | b'-') => {}
        Some(_) => return Err(Error::Protocol(format!("Malformed reply line: {line}"))),
    }

    code.parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code}")))
}

/// Checks whether a line ends a (possibly multi-line) reply.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() == 3 || (line.len() >= 4 && line.as_bytes()[3] == b' ')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_single_line_reply() {
        let reply = parse_reply(&lines(&["250 2.0.0 Ok: queued as 4F1A2"])).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.message, vec!["2.0.0 Ok: queued as 4F1A2"]);
    }

    #[test]
    fn test_parse_ehlo_reply() {
        let reply = parse_reply(&lines(&[
            "250-mx.example.org",
            "250-STARTTLS",
            "250 AUTH PLAIN LOGIN",
        ]))
        .unwrap();
        assert_eq!(reply.message, vec!["mx.example.org", "STARTTLS", "AUTH PLAIN LOGIN"]);
    }

    #[test]
    fn test_parse_bare_code() {
        let reply = parse_reply(&lines(&["354"])).unwrap();
        assert_eq!(reply.code, ReplyCode::START_DATA);
        assert_eq!(reply.message, vec![""]);
    }

    #[test]
    fn test_is_last_reply_line() {
        assert!(is_last_reply_line("250 OK"));
        assert!(is_last_reply_line("354"));
        assert!(!is_last_reply_line("250-Continuing"));
        assert!(!is_last_reply_line("25"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_reply(&[]).is_err());
        assert!(parse_reply(&lines(&["25"])).is_err());
        assert!(parse_reply(&lines(&["ABC OK"])).is_err());
        assert!(parse_reply(&lines(&["250xOK"])).is_err());
        assert!(parse_reply(&lines(&["250-one", "251 two"])).is_err());
    }
}
