//! Configuration
//!
//! Layering (later wins):
//! 1. Built-in defaults
//! 2. JSON file: explicit path, or `<config_dir>/skill-profiler/config.json`
//! 3. Environment: `ANTHROPIC_API_KEY`, `SKILL_PROFILER_MODE`,
//!    `SKILL_PROFILER_MODEL`, `SKILL_PROFILER_API_BASE`
//! 4. CLI flags (applied by the binary)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProfilerError, Result};

const CONFIG_DIR: &str = "skill-profiler";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Which backend performs profiling and matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Local,
    Remote,
}

impl std::str::FromStr for AnalysisMode {
    type Err = ProfilerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "heuristic" => Ok(AnalysisMode::Local),
            "remote" | "ai" => Ok(AnalysisMode::Remote),
            other => Err(ProfilerError::Config(format!(
                "unknown analysis mode '{}' (expected local or remote)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: AnalysisMode,
    pub log_level: String,
    pub catalog_path: Option<PathBuf>,
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Local,
            log_level: "warn".to_string(),
            catalog_path: None,
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location, if a config directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Parse a config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ProfilerError::Config(format!("cannot read {:?}: {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ProfilerError::Config(format!("invalid config {:?}: {}", path, e)))
    }

    /// Load defaults, then the config file, then environment overrides.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading config from {:?}", path);
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.remote.api_key = Some(key);
        }
        if let Some(mode) = non_empty("SKILL_PROFILER_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(model) = non_empty("SKILL_PROFILER_MODEL") {
            self.remote.model = model;
        }
        if let Some(base) = non_empty("SKILL_PROFILER_API_BASE") {
            self.remote.api_base = base;
        }
        Ok(())
    }
}
