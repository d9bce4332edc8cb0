//! Connector configuration.
//!
//! The host platform hands configuration over as JSON; [`FeedConfig`] deserializes from that
//! shape and normalizes the server URL on the way in.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where CSV data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// Fetch CSV text from the configured server URL.
    #[serde(rename = "Server URL")]
    ServerUrl,
    /// Resolve an attachment record, then download its file.
    #[serde(rename = "Attachment IRI")]
    AttachmentIri,
    /// Download a file resource directly.
    #[serde(rename = "File IRI")]
    FileIri,
}

impl InputMode {
    /// Label used by the host platform (and echoed in error messages).
    pub fn label(self) -> &'static str {
        match self {
            Self::ServerUrl => "Server URL",
            Self::AttachmentIri => "Attachment IRI",
            Self::FileIri => "File IRI",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Deserialize)]
struct RawFeedConfig {
    #[serde(default)]
    server_url: Option<String>,
    #[serde(default = "default_verify_ssl")]
    verify_ssl: bool,
    #[serde(rename = "input")]
    input_mode: InputMode,
    #[serde(default)]
    connect_timeout_secs: Option<u64>,
    #[serde(default)]
    read_timeout_secs: Option<u64>,
}

fn default_verify_ssl() -> bool {
    true
}

/// Connector configuration.
///
/// `server_url` is empty for the attachment/file modes; otherwise it always carries a scheme
/// and never ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFeedConfig")]
pub struct FeedConfig {
    pub server_url: String,
    pub verify_ssl: bool,
    #[serde(rename = "input")]
    pub input_mode: InputMode,
    /// Connect timeout; `None` keeps the transport default.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout; `None` keeps the transport default.
    pub read_timeout_secs: Option<u64>,
}

impl From<RawFeedConfig> for FeedConfig {
    fn from(raw: RawFeedConfig) -> Self {
        Self {
            server_url: normalize_server_url(raw.server_url.as_deref().unwrap_or_default()),
            verify_ssl: raw.verify_ssl,
            input_mode: raw.input_mode,
            connect_timeout_secs: raw.connect_timeout_secs,
            read_timeout_secs: raw.read_timeout_secs,
        }
    }
}

impl FeedConfig {
    pub fn new(server_url: &str, verify_ssl: bool, input_mode: InputMode) -> Self {
        Self {
            server_url: normalize_server_url(server_url),
            verify_ssl,
            input_mode,
            connect_timeout_secs: None,
            read_timeout_secs: None,
        }
    }

    /// Configuration for the attachment/file modes, which need no server URL.
    pub fn for_files(input_mode: InputMode) -> Self {
        Self::new("", true, input_mode)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

/// Ensure a scheme (defaulting to `https://`) and strip trailing slashes.
///
/// An empty (or whitespace-only) input stays empty.
pub fn normalize_server_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let with_scheme = if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    with_scheme.trim_end_matches('/').to_string()
}
