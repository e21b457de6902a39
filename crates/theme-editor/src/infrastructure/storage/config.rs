//! TOML-based application configuration for the theme editor.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\LiveTheme\config.toml`
//! - Linux:    `~/.config/livetheme/config.toml`
//! - macOS:    `~/Library/Application Support/LiveTheme/config.toml`
//!
//! Example:
//!
//! ```toml
//! [site]
//! record_path = "/var/lib/livetheme/site.toml"
//!
//! [access]
//! privileged_roles = ["admin", "super_admin"]
//!
//! [editor]
//! notice_ttl_ms = 3000
//!
//! [logging]
//! level = "info"
//!
//! [profiles]
//! alice = "admin"
//! bob = "customer"
//! ```
//!
//! # Serde default values
//!
//! Every section and every field has a default, so a missing file, an empty
//! file, and a file written by an older version all load successfully.
//!
//! This file configures the *editor process*.  The site's colors and copy live
//! in the separate record file (see [`super::record_file`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use theme_core::RolePolicy;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Identity → role string, consulted by the local profile table.
    #[serde(default)]
    pub profiles: BTreeMap<String, String>,
}

/// Where the site record is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
    /// Path of the TOML record file.  Defaults to `site.toml` next to the
    /// config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_path: Option<PathBuf>,
}

/// Who may edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessConfig {
    /// Role strings that unlock the editor.  Matched case-insensitively.
    #[serde(default = "default_privileged_roles")]
    pub privileged_roles: Vec<String>,
}

/// Editor panel behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    /// How long save confirmations and errors stay visible, in milliseconds.
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_privileged_roles() -> Vec<String> {
    vec!["admin".to_string(), "super_admin".to_string()]
}
fn default_notice_ttl_ms() -> u64 {
    3000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            privileged_roles: default_privileged_roles(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// The role policy described by `[access]`.
    pub fn role_policy(&self) -> RolePolicy {
        RolePolicy::new(&self.access.privileged_roles)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.editor.notice_ttl_ms)
    }

    /// The record file path: `[site].record_path`, else `site.toml` in the
    /// platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] when no path is configured
    /// and the platform directory cannot be determined.
    pub fn record_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.site.record_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("site.toml")),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not yet exist.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning defaults if the file is missing.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("LiveTheme"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("livetheme"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("LiveTheme")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
