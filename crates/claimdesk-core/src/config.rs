//! Configuration management for ClaimDesk.
//!
//! Loads configuration from ${CLAIMDESK_HOME}/config.toml with sensible defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Env var that overrides the configured API origin.
pub const API_URL_ENV: &str = "CLAIMDESK_API_URL";

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments/sections from the template stay present while the user's
/// values win.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for ClaimDesk configuration and data.
    //!
    //! CLAIMDESK_HOME resolution order:
    //! 1. CLAIMDESK_HOME environment variable (if set)
    //! 2. ~/.config/claimdesk (default)

    use std::env;
    use std::path::PathBuf;

    /// Returns the ClaimDesk home directory.
    pub fn claimdesk_home() -> PathBuf {
        if let Ok(home) = env::var("CLAIMDESK_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".claimdesk"),
            |h| h.join(".config").join("claimdesk"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        claimdesk_home().join("config.toml")
    }

    /// Returns the path of the persisted session token.
    pub fn session_path() -> PathBuf {
        claimdesk_home().join("session.json")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive (`info`, `debug`, ...).
    pub level: String,
    /// Log file, relative to the home directory unless absolute.
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "logs/claimdesk.log".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin of the claim-review API
    pub api_base_url: String,

    /// Per-request timeout in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API origin with precedence: env > config > default.
    ///
    /// Trailing slashes are stripped so endpoint paths can be appended.
    ///
    /// # Errors
    /// Returns an error if the resolved origin is not an http(s) URL.
    pub fn effective_api_base_url(&self) -> Result<String> {
        let from_env = env::var(API_URL_ENV).ok();
        let candidate = [from_env.as_deref(), Some(self.api_base_url.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or(Self::DEFAULT_API_BASE_URL);

        validate_base_url(candidate)?;
        Ok(candidate.trim_end_matches('/').to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Returns the absolute path of the log file.
    pub fn log_path(&self) -> PathBuf {
        let file = Path::new(&self.log.file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            paths::claimdesk_home().join(file)
        }
    }

    /// Saves only the `api_base_url` field to the config file.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_api_base_url(url: &str) -> Result<()> {
        Self::save_api_base_url_to(&paths::config_path(), url)
    }

    /// Saves only the `api_base_url` field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid, the existing file cannot be
    /// parsed, or the write fails.
    pub fn save_api_base_url_to(path: &Path, url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let trimmed = url.trim();
        validate_base_url(trimmed)?;

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["api_base_url"] = value(trimmed.trim_end_matches('/'));

        Self::write_config(path, &doc.to_string())
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 0,
            log: LogConfig::default(),
        }
    }
}

/// Only http(s) origins are accepted.
fn validate_base_url(raw: &str) -> Result<()> {
    let parsed =
        Url::parse(raw).with_context(|| format!("Invalid API base URL: {raw}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Invalid API base URL: {raw} (expected http or https)");
    }
    Ok(())
}
