//! Project-level configuration support
//!
//! Loads `labsig.toml` from a directory (normally the working directory).
//! It uses the same schema as the user config and wins over it.
//!
//! ```toml
//! # labsig.toml
//! [patient]
//! sex = "female"
//! age = 72
//!
//! [output]
//! format = "markdown"
//! ```

use super::user_config::{read_config_file, UserConfig};
use std::path::{Path, PathBuf};

/// File name looked up in the project directory
pub const PROJECT_CONFIG_FILE: &str = "labsig.toml";

pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILE)
}

/// Load `labsig.toml` from `dir`, if present and valid
pub fn load_project_config(dir: &Path) -> Option<UserConfig> {
    let path = project_config_path(dir);
    if !path.exists() {
        return None;
    }
    read_config_file(&path)
}
