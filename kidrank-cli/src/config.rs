/// Config file loading and creation for the kidrank CLI.
///
/// Config lives at ~/.config/kidrank/config.toml.
/// All fields are optional — CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default)]
pub struct KidrankConfig {
    /// Directory holding profile documents and saved survey progress.
    pub data_dir: Option<String>,
    /// Default number of questions per survey.
    pub pairs: Option<usize>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# kidrank configuration
# All values here can be overridden by CLI flags.

# Directory for profile documents and saved survey progress.
# data_dir = \"~/.local/share/kidrank\"

# Default number of questions per survey.
# pairs = 10
";

/// Returns the default config path: ~/.config/kidrank/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("kidrank").join("config.toml")
}

/// Returns the default data directory: ~/.local/share/kidrank
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".local").join("share").join("kidrank")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> KidrankConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            toml::from_str(&content)
                .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => KidrankConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> PathBuf {
    let path = config_path();

    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));

    path
}
