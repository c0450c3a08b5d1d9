//! Configuration management for the guestbook admin tools.
//!
//! Loads configuration from ${GUESTBOOK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default base URL for the guestbook backend API.
pub const DEFAULT_BASE_URL: &str = "https://backend.ricefield-dev.cloud/api/v1";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL override for the backend API
    pub base_url: Option<String>,

    /// Page size used for paginated listings
    pub page_size: u32,
}

impl Config {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Loads configuration from the default location, falling back to
    /// defaults when the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Resolves the API base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the resolved URL is not well-formed.
pub fn resolve_base_url(config_base_url: Option<&str>) -> Result<String> {
    // Try env var first
    if let Ok(env_url) = std::env::var("GUESTBOOK_BASE_URL") {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    // Try config value
    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    // Default
    Ok(DEFAULT_BASE_URL.to_string())
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
    Ok(())
}

pub mod paths {
    //! Path resolution for guestbook configuration and session data.
    //!
    //! GUESTBOOK_HOME resolution order:
    //! 1. GUESTBOOK_HOME environment variable (if set)
    //! 2. ~/.config/guestbook (default)

    use std::path::PathBuf;

    /// Returns the guestbook home directory.
    pub fn guestbook_home() -> PathBuf {
        if let Ok(home) = std::env::var("GUESTBOOK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("guestbook"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        guestbook_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        guestbook_home().join("session.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: missing config file yields defaults.
    #[test]
    fn test_missing_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.base_url, None);
        assert_eq!(config.page_size, Config::DEFAULT_PAGE_SIZE);
    }

    /// Test: partial config files fill in defaults for missing fields.
    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"https://staging.example/api/v1\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://staging.example/api/v1")
        );
        assert_eq!(config.page_size, Config::DEFAULT_PAGE_SIZE);
    }

    /// Test: malformed TOML is an error, not a silent default.
    #[test]
    fn test_malformed_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = [nonsense").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    /// Test: an invalid configured URL is rejected during resolution.
    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(resolve_base_url(Some("not a url")).is_err());
    }
}
