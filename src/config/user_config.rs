//! User-level configuration for labsig
//!
//! Supports loading config from (lowest to highest priority):
//! - ~/.config/labsig/config.toml
//! - ./labsig.toml (see `project_config`)
//! - Environment variables (`LABSIG_SEX`, `LABSIG_AGE`, `LABSIG_FASTING`,
//!   `LABSIG_FORMAT`, `NO_COLOR`)

use super::project_config::load_project_config;
use crate::models::{ContextOverrides, PatientContext, Sex};
use crate::reporters::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    /// Default patient context when a request does not supply one
    #[serde(default)]
    pub patient: ContextOverrides,

    #[serde(default)]
    pub output: OutputConfig,

    /// Files that contributed to this config, in load order
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Default output format: text, json, markdown
    pub format: Option<String>,

    /// ANSI colors in text output (default: true)
    pub color: Option<bool>,
}

impl UserConfig {
    /// Load config from all sources, environment last
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let mut config = Self::load_files(Self::user_config_path().as_deref(), &cwd);
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load the user file and the project file, without the environment
    pub fn load_files(user_path: Option<&Path>, project_dir: &Path) -> Self {
        let mut config = UserConfig::default();

        if let Some(path) = user_path.filter(|p| p.exists()) {
            if let Some(user_config) = read_config_file(path) {
                config.merge(user_config);
            }
        }

        if let Some(project_config) = load_project_config(project_dir) {
            config.merge(project_config);
        }

        config
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("labsig").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: UserConfig) {
        self.patient.merge(&other.patient);
        if other.output.format.is_some() {
            self.output.format = other.output.format;
        }
        if other.output.color.is_some() {
            self.output.color = other.output.color;
        }
        self.sources.extend(other.sources);
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(sex) = lookup("LABSIG_SEX") {
            self.patient.sex = Some(Sex::from_lenient(&sex));
        }
        if let Some(age) = lookup("LABSIG_AGE") {
            match age.trim().parse::<u32>() {
                Ok(age) => self.patient.age = Some(age),
                Err(_) => warn!("Ignoring LABSIG_AGE={:?}: not a whole number", age),
            }
        }
        if let Some(fasting) = lookup("LABSIG_FASTING") {
            match parse_bool(&fasting) {
                Some(fasting) => self.patient.fasting = Some(fasting),
                None => warn!("Ignoring LABSIG_FASTING={:?}: expected true/false", fasting),
            }
        }
        if let Some(format) = lookup("LABSIG_FORMAT") {
            match format.parse::<OutputFormat>() {
                Ok(_) => self.output.format = Some(format),
                Err(e) => warn!("Ignoring LABSIG_FORMAT={:?}: {}", format, e),
            }
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.output.color = Some(false);
        }
    }

    /// Default patient context after all layers
    pub fn patient_context(&self) -> PatientContext {
        self.patient.apply(PatientContext::default())
    }

    pub fn format(&self) -> &str {
        self.output.format.as_deref().unwrap_or("text")
    }

    pub fn color_enabled(&self) -> bool {
        self.output.color.unwrap_or(true)
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, EXAMPLE_CONFIG)
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
        }

        Ok(config_path)
    }
}

pub(crate) const EXAMPLE_CONFIG: &str = r#"# labsig configuration

[patient]
# Defaults applied when a request does not say otherwise
# sex = "unknown"   # male, female, unknown
# age = 30
# fasting = false

[output]
# Default output format (text, json, markdown)
# format = "text"

# ANSI colors in text output
# color = true
"#;

/// Parse a TOML config file; unreadable or malformed files are skipped with a warning
pub(crate) fn read_config_file(path: &Path) -> Option<UserConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match toml::from_str::<UserConfig>(&content) {
        Ok(mut config) => {
            debug!("Loaded config from {}", path.display());
            if let Some(format) = &config.output.format {
                if let Err(e) = format.parse::<OutputFormat>() {
                    warn!("Ignoring output.format in {}: {}", path.display(), e);
                    config.output.format = None;
                }
            }
            config.sources.push(path.to_path_buf());
            Some(config)
        }
        Err(e) => {
            warn!("Ignoring invalid config {}: {}", path.display(), e);
            None
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
