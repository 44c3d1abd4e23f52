use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    discovery::ExtensionSet,
    llm::{ClassifierSettings, ProviderKind},
};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_ROOT_DIR: &str = "systemd11/src/vconsole";
pub const ENV_PREFIX: &str = "VULNSWEEP";

/// Models analyzed when the configuration does not list any, in run order.
pub const DEFAULT_MODELS: &[&str] = &[
    "moonshotai/kimi-k2-instruct-0905",
    "qwen/qwen3-32b",
    "gemma2-9b-it",
    "meta-llama/Llama-Guard-4-12B",
    "llama-3.3-70b-versatile",
    "llama-3.1-8b-instant",
    "meta-llama/llama-4-maverick-17b-128e-instruct",
    "meta-llama/llama-4-scout-17b-16e-instruct",
];

/// Fatal configuration problems detected before any analysis starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration file '{path}' not found; create it with your API key, e.g. {{\"api_key\": \"YOUR_API_KEY\"}}")]
    MissingFile { path: String },
    #[error("key 'api_key' not found in configuration file '{path}'")]
    MissingApiKey { path: String },
    #[error("configuration must list at least one model")]
    NoModels,
}

/// Settings for one run, built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub root_dir: PathBuf,
    /// Model identifiers, processed in this order.
    pub models: Vec<String>,
    pub extensions: ExtensionSet,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    api_key: Option<String>,
    provider: Option<String>,
    endpoint: Option<String>,
    root_dir: Option<PathBuf>,
    models: Option<Vec<String>>,
    extensions: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

impl RunConfiguration {
    /// Load from a JSON file, letting `VULNSWEEP_*` environment variables override its keys.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            }
            .into());
        }
        let raw: RawConfig = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(true))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .with_context(|| format!("invalid configuration file '{}'", path.display()))?;
        Self::from_raw(raw, path)
    }

    fn from_raw(raw: RawConfig, path: &Path) -> Result<Self> {
        let provider = match raw.provider.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.parse::<ProviderKind>()?,
            _ => ProviderKind::default(),
        };
        let api_key = raw
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let api_key = match (provider, api_key) {
            (_, Some(key)) => key,
            (ProviderKind::Noop, None) => String::new(),
            (_, None) => {
                return Err(ConfigError::MissingApiKey {
                    path: path.display().to_string(),
                }
                .into())
            }
        };

        let models = match raw.models {
            Some(models) => models
                .into_iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect::<Vec<_>>(),
            None => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };
        if models.is_empty() {
            return Err(ConfigError::NoModels.into());
        }

        let extensions = raw
            .extensions
            .map(ExtensionSet::new)
            .unwrap_or_default();

        Ok(Self {
            root_dir: raw
                .root_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_DIR)),
            models,
            extensions,
            classifier: ClassifierSettings {
                provider,
                api_key,
                endpoint: raw.endpoint,
                timeout_secs: raw.timeout_secs,
            },
        })
    }

    /// Replace the model list, rejecting an empty one.
    pub fn with_models(mut self, models: Vec<String>) -> Result<Self> {
        if models.is_empty() {
            return Err(ConfigError::NoModels.into());
        }
        self.models = models;
        Ok(self)
    }
}
