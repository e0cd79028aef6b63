//! Configuration module for labsig
//!
//! This module handles:
//! - User-level configuration (~/.config/labsig/config.toml)
//! - Project-level configuration (labsig.toml)
//! - Environment overrides
//! - Default patient context and output settings

mod project_config;
mod user_config;

pub use project_config::{load_project_config, project_config_path, PROJECT_CONFIG_FILE};
pub use user_config::{OutputConfig, UserConfig};
