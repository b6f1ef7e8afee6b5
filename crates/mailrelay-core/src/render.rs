//! Sender address templates.
//!
//! Templates may contain `{{server}}` and `{{hostname}}`, with optional
//! whitespace inside the braces. Anything else, including unknown names and
//! unclosed braces, is copied through untouched.

/// Values available to a sender template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars<'a> {
    /// The account's mail server.
    pub server: &'a str,
    /// This machine's hostname.
    pub hostname: &'a str,
}

impl TemplateVars<'_> {
    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "server" => Some(self.server),
            "hostname" => Some(self.hostname),
            _ => None,
        }
    }
}

/// Expands the known placeholders in `template`.
#[must_use]
pub fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        match vars.lookup(after[..end].trim()) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VARS: TemplateVars<'static> = TemplateVars {
        server: "mail.example.org",
        hostname: "h",
    };

    #[test]
    fn expands_server() {
        assert_eq!(render("bot@{{server}}", &VARS), "bot@mail.example.org");
    }

    #[test]
    fn expands_hostname_with_spaces() {
        assert_eq!(render("relay@{{ hostname }}", &VARS), "relay@h");
        assert_eq!(render("{{server}}-{{  hostname}}", &VARS), "mail.example.org-h");
    }

    #[test]
    fn unknown_placeholder_is_literal() {
        assert_eq!(render("bot@{{domain}}", &VARS), "bot@{{domain}}");
    }

    #[test]
    fn unclosed_brace_is_literal() {
        assert_eq!(render("bot@{{server", &VARS), "bot@{{server");
        assert_eq!(render("a}}b{{", &VARS), "a}}b{{");
    }

    #[test]
    fn single_braces_untouched() {
        assert_eq!(render("{server}", &VARS), "{server}");
    }

    proptest! {
        #[test]
        fn brace_free_text_passes_through(s in "[^{}]*") {
            prop_assert_eq!(render(&s, &VARS), s);
        }

        #[test]
        fn deterministic(s in ".*", server in "[a-z.]{0,20}", hostname in "[a-z]{0,10}") {
            let vars = TemplateVars { server: &server, hostname: &hostname };
            prop_assert_eq!(render(&s, &vars), render(&s, &vars));
        }

        #[test]
        fn server_substituted(server in "[a-z][a-z.]{0,30}") {
            let vars = TemplateVars { server: &server, hostname: "h" };
            prop_assert_eq!(render("bot@{{server}}", &vars), format!("bot@{server}"));
        }
    }
}
