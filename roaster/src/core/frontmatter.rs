//! TOML frontmatter parsing for dev-log entries.
//!
//! Entries open with a `+++` line, a TOML block, and a closing `+++` line.
//! A missing header is not an error: it parses to an empty record. Only a
//! header whose TOML body is invalid fails.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use toml::{Table, Value};

static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\A\x{FEFF}?(?:[ \t]*\r?\n)*\+\+\+[ \t]*\r?\n(?:(.*?)\r?\n)?\+\+\+[ \t]*(?:\r?\n|\z)",
    )
    .expect("frontmatter regex should be valid")
});

/// Error raised when a `+++` header is present but its body is not TOML.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("malformed frontmatter: {0}")]
    Format(#[from] toml::de::Error),
}

/// Parsed frontmatter of a single entry.
///
/// Only `draft` and `params.authorGitHubHandle` are interpreted; every key is
/// still available through [`Frontmatter::fields`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    /// `draft`, `false` when absent or not a boolean.
    pub draft: bool,
    /// `params.authorGitHubHandle`, empty when absent or not a string.
    pub author: String,
    /// The full parsed table.
    pub fields: Table,
}

impl Frontmatter {
    pub fn from_table(fields: Table) -> Self {
        let draft = fields
            .get("draft")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let author = fields
            .get("params")
            .and_then(Value::as_table)
            .and_then(|params| params.get("authorGitHubHandle"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            draft,
            author,
            fields,
        }
    }

    /// True when no header was found (or the header was empty).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.fields
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Parse the frontmatter at the start of `content`.
pub fn parse_frontmatter(content: &str) -> Result<Frontmatter, FrontmatterError> {
    let Some(caps) = FRONTMATTER_RE.captures(content) else {
        return Ok(Frontmatter::default());
    };
    let raw = caps.get(1).map_or("", |m| m.as_str());
    let fields: Table = toml::from_str(raw)?;
    Ok(Frontmatter::from_table(fields))
}
