//! Server replies.

use std::fmt;

/// Class of a reply, taken from the first digit of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// 2xx: the command was accepted.
    Completion,
    /// 3xx: the server is waiting for more input.
    Intermediate,
    /// 4xx: temporary failure, the command may succeed later.
    Transient,
    /// 5xx: the command will not succeed as sent.
    Permanent,
    /// Anything outside 200-599.
    Unknown,
}

/// Three-digit reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 greeting.
    pub const SERVICE_READY: Self = Self(220);
    /// 221 answer to QUIT.
    pub const CLOSING: Self = Self(221);
    /// 250 action completed.
    pub const OK: Self = Self(250);
    /// 334 AUTH challenge.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 answer to DATA.
    pub const START_DATA: Self = Self(354);
    /// 535 credentials refused.
    pub const AUTH_FAILED: Self = Self(535);

    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Numeric value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Class of this code.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match self.0 / 100 {
            2 => ReplyClass::Completion,
            3 => ReplyClass::Intermediate,
            4 => ReplyClass::Transient,
            5 => ReplyClass::Permanent,
            _ => ReplyClass::Unknown,
        }
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.class(), ReplyClass::Completion)
    }

    /// 4xx.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self.class(), ReplyClass::Transient)
    }

    /// 5xx.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self.class(), ReplyClass::Permanent)
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete, possibly multi-line, server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code shared by every line.
    pub code: ReplyCode,
    /// Text of each line with the code stripped.
    pub message: Vec<String>,
}

impl Reply {
    /// Builds a reply from its code and lines.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// True for a 2xx reply.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Lines joined with newlines.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        for (i, line) in self.message.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { " / " })?;
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(ReplyCode::OK.class(), ReplyClass::Completion);
        assert_eq!(ReplyCode::START_DATA.class(), ReplyClass::Intermediate);
        assert_eq!(ReplyCode::new(421).class(), ReplyClass::Transient);
        assert_eq!(ReplyCode::AUTH_FAILED.class(), ReplyClass::Permanent);
        assert_eq!(ReplyCode::new(99).class(), ReplyClass::Unknown);
        assert!(ReplyCode::new(451).is_transient());
        assert!(!ReplyCode::OK.is_permanent());
    }

    #[test]
    fn multi_line_display() {
        let reply = Reply::new(
            ReplyCode::SERVICE_READY,
            vec!["mx.example.org ESMTP".to_string(), "ready".to_string()],
        );
        assert_eq!(reply.message_text(), "mx.example.org ESMTP\nready");
        assert_eq!(reply.to_string(), "220 mx.example.org ESMTP / ready");
    }

    #[test]
    fn bare_code_display() {
        let reply = Reply::new(ReplyCode::OK, vec![]);
        assert_eq!(reply.message_text(), "");
        assert_eq!(reply.to_string(), "250");
    }
}
