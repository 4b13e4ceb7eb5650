//! Command template rendering
//!
//! The target command is given once on the command line and rendered per
//! payload. If the template contains the `{payload}` token, every occurrence
//! is replaced with the payload's path; otherwise the path is appended as a
//! trailing whitespace-separated argument. A braced token is used rather
//! than a `$`-prefixed one so the host shell cannot expand it first.

use std::fmt;
use std::path::Path;

/// Token replaced with the payload path in the command template.
pub const PLACEHOLDER: &str = "{payload}";

/// A shell command template, rendered once per payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    raw: String,
}

impl CommandTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The template as given on the command line.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn has_placeholder(&self) -> bool {
        self.raw.contains(PLACEHOLDER)
    }

    /// Render the command line for one payload.
    pub fn render(&self, payload: &Path) -> String {
        let path = payload.display().to_string();
        if self.has_placeholder() {
            self.raw.replace(PLACEHOLDER, &path)
        } else {
            format!("{} {}", self.raw, path)
        }
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
