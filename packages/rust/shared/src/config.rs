//! Application configuration for doctools.
//!
//! User config lives at `~/.doctools/doctools.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocToolsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "doctools.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".doctools";

// ---------------------------------------------------------------------------
// Config structs (matching doctools.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Index page generation.
    #[serde(default)]
    pub index: IndexConfig,

    /// HTML rendering.
    #[serde(default)]
    pub html: HtmlConfig,

    /// Issue/PR antispam heuristics.
    #[serde(default)]
    pub antispam: AntispamConfig,
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Heading text marking where the index page is inserted.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Title of the generated index page heading.
    #[serde(default = "default_index_title")]
    pub title: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            title: default_index_title(),
        }
    }
}

fn default_placeholder() -> String {
    "put-index-page-here".into()
}
fn default_index_title() -> String {
    "Index Page".into()
}

/// `[html]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Wrap output in `<html>`/`<head>`/`<body>`.
    #[serde(default = "default_true")]
    pub complete_document: bool,

    /// Document `<title>`; falls back to the first heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            complete_document: true,
            title: None,
        }
    }
}

/// `[antispam]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntispamConfig {
    /// Add the `suspicious` label to flagged issues/PRs.
    #[serde(default)]
    pub label_if_suspicious: bool,

    /// Post a warning comment on flagged issues/PRs.
    #[serde(default)]
    pub comment_if_suspicious: bool,

    /// Close flagged issues/PRs.
    #[serde(default)]
    pub close_if_suspicious: bool,

    /// Number of failed checks tolerated before flagging.
    #[serde(default)]
    pub suspicious_criteria_tolerated: usize,

    /// Minimum title and body length, in characters.
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Accounts younger than this many hours count as recently created.
    #[serde(default = "default_recent_account_hours")]
    pub recent_account_hours: i64,

    /// Whether the account age check runs at all.
    #[serde(default = "default_true")]
    pub check_account_age: bool,
}

impl Default for AntispamConfig {
    fn default() -> Self {
        Self {
            label_if_suspicious: false,
            comment_if_suspicious: false,
            close_if_suspicious: false,
            suspicious_criteria_tolerated: 0,
            min_text_length: default_min_text_length(),
            recent_account_hours: default_recent_account_hours(),
            check_account_age: true,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_min_text_length() -> usize {
    20
}
fn default_recent_account_hours() -> i64 {
    2
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.doctools/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocToolsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.doctools/doctools.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocToolsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocToolsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_at(&config_file_path()?)
}

/// Write the default config to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| DocToolsError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocToolsError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| DocToolsError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}
