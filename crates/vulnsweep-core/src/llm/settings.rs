use std::{fmt, str::FromStr, time::Duration};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Per-request timeout applied when `timeout_secs` is not configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Completion backends understood by [`super::build_classifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    #[serde(rename = "openai")]
    OpenAi,
    Noop,
}

impl ProviderKind {
    /// Base URL used when no `endpoint` is configured.
    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Noop => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            "noop" => Ok(Self::Noop),
            other => bail!("unknown provider `{other}` (expected groq, openai or noop)"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Noop => "noop",
        };
        f.write_str(label)
    }
}

/// Connection settings for the remote completion service.
#[derive(Clone, PartialEq, Eq)]
pub struct ClassifierSettings {
    pub provider: ProviderKind,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ClassifierSettings {
    /// Base URL for requests, without a trailing slash.
    pub fn base_url(&self) -> Option<String> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| self.provider.default_endpoint())
            .map(|value| value.trim_end_matches('/').to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

// Keeps the credential out of logs and panic messages.
impl fmt::Debug for ClassifierSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
