//! Configuration file management.
//!
//! Handles loading and writing the TOML configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Teams Chat Export Configuration
# Auto-generated - edit as needed

[collector]
# Wait after each scroll to the top, in ms
top_settle_ms = 350

# Pause between the upward and downward sweeps, in ms
bottom_pause_ms = 500

# Wait after each scroll to the bottom, in ms
bottom_settle_ms = 300

# Iteration bounds for each sweep
max_top_iterations = 300
max_bottom_iterations = 50

# Unchanged scroll offsets in a row that mean the top was reached
stable_top_checks = 3

# Distance from the end that counts as the bottom, in px
bottom_tolerance_px = 10.0

[extractor]
# Ancestor levels searched for sender and time
max_depth = 10
time_attribute = "datetime"

[markers]
message = '[data-tid="chat-pane-message"]'
author = '[data-tid="message-author-name"]'
time = "time[datetime]"
title = '[data-tid="chat-title"]'
heading = "h2"
message_hint = '[data-tid*="message"]'
containers = [
    '[data-tid="message-pane-list-container"]',
    '[data-tid="chat-pane-list"]',
    'div[class*="fui-ChatMessageList"]',
    'div[class*="message-list"]',
]

[export]
output_dir = "exports"
"#;

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields the defaults.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Create the default configuration file if it doesn't exist.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: Option<&Path>) -> Result<PathBuf> {
    let config_path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);

    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create config directory", e))?;
        }

        fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| AppError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(config_path)
}
