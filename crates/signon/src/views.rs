//! HTML pages.
//!
//! Every page is a [`Template`]: a value that knows its title and how to write its body. [`Page`]
//! wraps a template into the shared layout and turns it into a response.

use std::fmt;

use axum::response::{Html, IntoResponse, Response};

use crate::identity::UserIdentity;

pub trait Template {
    fn title(&self) -> &str;

    /// Writes the contents of `<body>`.
    ///
    /// Any user-controlled text has to go through [`Escape`].
    fn render_body(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result;
}

#[derive(Debug)]
pub struct Page<T>(pub T);

impl<T: Template> fmt::Display for Page<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n",
            Escape(self.0.title()),
        )?;

        self.0.render_body(fmt)?;

        fmt.write_str("</body>\n</html>\n")
    }
}

impl<T: Template> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// Displays a string with HTML special characters escaped.
#[derive(Debug, Clone, Copy)]
pub struct Escape<'a>(pub &'a str);

impl fmt::Display for Escape<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;

        while let Some(idx) = rest.find(['&', '<', '>', '"', '\'']) {
            fmt.write_str(&rest[..idx])?;
            fmt.write_str(match rest.as_bytes()[idx] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            })?;
            rest = &rest[idx + 1..];
        }

        fmt.write_str(rest)
    }
}

/// The landing page: who is logged in, and a button to change that.
#[derive(Debug)]
pub struct Index {
    pub identity: Option<UserIdentity>,

    /// Whether the last login attempt failed.
    pub failed: bool,
}

impl Template for Index {
    fn title(&self) -> &str {
        "signon"
    }

    fn render_body(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity {
            Some(ref identity) => {
                writeln!(
                    out,
                    "<p>Logged in as <code>{}</code> (ID <code>{}</code>).</p>",
                    Escape(identity.claimed_id().as_str()),
                    identity.numeric_id(),
                )?;
                writeln!(out, "<form action=\"/auth/logout\" method=\"post\">")?;
                writeln!(out, "<button type=\"submit\">Logout</button>")?;
                writeln!(out, "</form>")
            },
            None => {
                if self.failed {
                    writeln!(out, "<p>Login failed.</p>")?;
                }

                writeln!(out, "<p>Not logged in.</p>")?;
                writeln!(out, "<form action=\"/auth/login\" method=\"post\">")?;
                writeln!(out, "<button type=\"submit\">Login with Steam</button>")?;
                writeln!(out, "</form>")
            },
        }
    }
}
