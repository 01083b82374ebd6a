//! Configuration File Loading
//!
//! Finds, parses and validates the TOML configuration file, falling back to
//! built-in defaults when none exists.

use super::Config;
use crate::error::{Error, Result};
use crate::security_audit::{log_security_event, SecurityEvent};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "REPOTOOLS_CONFIG";

/// Configuration file loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Search paths for configuration files, in priority order
    search_paths: Vec<PathBuf>,
    /// Path of the file that was loaded, if any
    current_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            current_path: None,
        }
    }

    /// Load configuration from the default search paths
    pub fn load() -> Result<Config> {
        Self::new().load_config()
    }

    /// Load configuration from an explicit file; the file must exist
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let mut loader = Self::new();
        loader.set_search_path(path.to_path_buf());
        let config = loader.load_config_file(path)?;
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load the first configuration file found, or defaults
    pub fn load_config(&mut self) -> Result<Config> {
        if let Some((path, config)) = self.find_and_load_config()? {
            Self::validate_config(&config)?;
            log_security_event(
                SecurityEvent::ConfigLoaded,
                Some(&format!("path={}", path.display())),
            );
            self.current_path = Some(path);
            return Ok(config);
        }

        debug!("No configuration file found, using defaults");
        let config = Config::default();
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Find and load configuration from search paths
    fn find_and_load_config(&self) -> Result<Option<(PathBuf, Config)>> {
        for path in &self.search_paths {
            if !path.is_file() {
                continue;
            }

            match self.load_config_file(path) {
                Ok(config) => return Ok(Some((path.clone(), config))),
                Err(e) => {
                    // Log warning but continue searching
                    log_security_event(
                        SecurityEvent::ConfigError,
                        Some(&format!("path={}", path.display())),
                    );
                    warn!("Failed to load config from {}: {}", path.display(), e);
                    continue;
                }
            }
        }

        Ok(None)
    }

    /// Load a specific configuration file
    fn load_config_file(&self, path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
            if !explicit.trim().is_empty() {
                paths.push(PathBuf::from(explicit));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("repotools").join("config.toml"));
        }

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join("repotools.toml"));
        }

        paths
    }

    /// Validate configuration
    fn validate_config(config: &Config) -> Result<()> {
        config.validate().map_err(Error::from)
    }

    /// Get the current configuration file path
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add a custom search path with the lowest priority
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
