//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use strata::{StrataError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for StrataError {
    fn from(err: ConfigError) -> Self {
        StrataError::Io(io::Error::other(err.to_string()))
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (strata/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or has invalid colors
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, StrataError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("strata/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "strata", "strata") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, StrataError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let style = config.style();
    for color in [
        style.background_color(),
        style.bar_color(),
        style.line_color(),
        style.text_color(),
    ] {
        color.map_err(ConfigError::Validation)?;
    }

    if style.year_width() <= 0.0 || style.row_height() <= 0.0 {
        return Err(ConfigError::Validation(
            "year_width and row_height must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_explicit_config_loaded() {
        let file = config_file("[style]\nrow_height = 30.0\n");

        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.style().row_height(), 30.0);
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = load_config(Some("/definitely/not/here/config.toml")).unwrap_err();

        assert!(err.to_string().contains("Missing configuration file"));
    }

    #[test]
    fn test_invalid_toml() {
        let file = config_file("[style\n");

        let err = load_config(Some(file.path())).unwrap_err();

        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let file = config_file("[style]\ntext_color = \"plaid\"\n");

        let err = load_config(Some(file.path())).unwrap_err();

        assert!(err.to_string().contains("Validation error"));
    }

    #[test]
    fn test_non_positive_sizes_rejected() {
        let file = config_file("[style]\nyear_width = 0.0\n");

        assert!(load_config(Some(file.path())).is_err());
    }
}
