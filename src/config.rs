//! Configuration: YAML file, environment overrides, defaults

use crate::llm::LlmConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "graphbridge.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Whole-program configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub discussion: DiscussionConfig,
    pub output: OutputConfig,
    pub run: RunConfig,
    /// Log filter directive, e.g. `info` or `graphbridge=debug`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscussionConfig {
    pub context_depth: usize,
    pub neighbor_limit: usize,
    pub min_response_chars: usize,
    pub transcript_cap: usize,
}

impl Default for DiscussionConfig {
    fn default() -> Self {
        Self {
            context_depth: 1,
            neighbor_limit: crate::graph::DEFAULT_NEIGHBOR_LIMIT,
            min_response_chars: crate::discussion::DEFAULT_MIN_RESPONSE_CHARS,
            transcript_cap: crate::persona::DEFAULT_TRANSCRIPT_CAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub edges_file: String,
    pub progress_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            edges_file: "cross_domain_edges.json".to_string(),
            progress_file: "progress.json".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn edges_path(&self) -> PathBuf {
        self.dir.join(&self.edges_file)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(&self.progress_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub checkpoint_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: crate::chatroom::DEFAULT_CHECKPOINT_EVERY,
        }
    }
}

impl Config {
    /// Parse YAML text.
    pub fn from_yaml_str(text: &str, origin: &Path) -> ConfigResult<Self> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read one config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    /// Load from `explicit`, else the first config file found, else
    /// defaults; then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match find_config_file() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Empty values are ignored. `GRAPHBRIDGE_API_KEY` wins over
    /// `OPENAI_API_KEY`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GRAPHBRIDGE_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(url) = get("GRAPHBRIDGE_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("GRAPHBRIDGE_MODEL") {
            self.llm.model = model;
        }
        if let Some(dir) = get("GRAPHBRIDGE_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(level) = get("GRAPHBRIDGE_LOG") {
            self.log_level = Some(level);
        }
    }

    /// Check settings; `live` also requires an API key.
    pub fn validate(&self, live: bool) -> ConfigResult<()> {
        if live && self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "no API key: set GRAPHBRIDGE_API_KEY or OPENAI_API_KEY".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        if self.output.edges_file.is_empty() || self.output.progress_file.is_empty() {
            return Err(ConfigError::Invalid("output file names must not be empty".to_string()));
        }
        Ok(())
    }
}

/// `./graphbridge.yaml`, then `<config dir>/graphbridge/graphbridge.yaml`.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("graphbridge").join(CONFIG_FILE_NAME);
    user.exists().then_some(user)
}
