//! Configuration Loader
//!
//! Environment-aware loading: base file, environment override file, then
//! environment variables, merged with the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::AppConfig;
use ::config::{Config, Environment, File, FileFormat, Map};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix for environment variable overrides (`SIMILAR_PRODUCTS__UPSTREAM__BASE_URL`)
pub const ENV_PREFIX: &str = "SIMILAR_PRODUCTS";

/// Separator between prefix, section and key in override variables
pub const ENV_SEPARATOR: &str = "__";

/// Loaded configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: AppConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    ///
    /// Useful for tests that must not depend on the process environment name.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Load configuration with variable overrides taken from `overrides`
    /// instead of the process environment
    ///
    /// Keys use the same `SIMILAR_PRODUCTS__SECTION__KEY` form as real
    /// environment variables.
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        overrides: Option<Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let explicit_dir = config_dir.is_some();
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        if !config_directory.is_dir() {
            if explicit_dir {
                return Err(ConfigurationError::ConfigDirectoryNotFound {
                    path: config_directory,
                });
            }
            warn!(
                config_dir = %config_directory.display(),
                "Configuration directory not found, using defaults and environment overrides"
            );
        }

        debug!(
            environment = %environment,
            config_dir = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment, overrides)?;
        config.validate()?;

        info!(
            environment = %environment,
            upstream = %config.upstream.base_url,
            bind_address = %config.server.bind_address,
            concurrency_level = config.service.concurrency_level,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Current environment name, lowercased
    ///
    /// Reads `SIMILAR_PRODUCTS_ENV`, then `APP_ENV`, defaulting to `development`.
    pub fn detect_environment() -> String {
        env::var("SIMILAR_PRODUCTS_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// `SIMILAR_PRODUCTS_CONFIG_DIR`, or `./config`
    fn default_config_directory() -> PathBuf {
        env::var("SIMILAR_PRODUCTS_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        overrides: Option<Map<String, String>>,
    ) -> ConfigResult<AppConfig> {
        let base_path = config_directory.join("base.yaml");
        let env_path = config_directory.join(format!("{environment}.yaml"));

        debug!(
            base = %base_path.display(),
            base_exists = base_path.exists(),
            overlay = %env_path.display(),
            overlay_exists = env_path.exists(),
            "Resolving configuration files"
        );

        let env_source = Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(overrides);

        let merged = Config::builder()
            .add_source(File::from(base_path).format(FileFormat::Yaml).required(false))
            .add_source(File::from(env_path).format(FileFormat::Yaml).required(false))
            .add_source(env_source)
            .build()
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        merged
            .try_deserialize::<AppConfig>()
            .map_err(ConfigurationError::deserialize_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_directory_is_an_error() {
        let result = ConfigManager::load_from_directory_with_env(
            Some(PathBuf::from("/definitely/not/a/config/dir")),
            "test",
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::ConfigDirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_overrides_apply_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = Map::new();
        overrides.insert(
            "SIMILAR_PRODUCTS__SERVICE__CONCURRENCY_LEVEL".to_string(),
            "3".to_string(),
        );

        let manager =
            ConfigManager::load_with_overrides(Some(dir.path().to_path_buf()), "test", Some(overrides))
                .unwrap();

        assert_eq!(manager.config().service.concurrency_level, 3);
        assert_eq!(manager.config().upstream.base_url, "http://localhost:3001");
        assert_eq!(manager.environment(), "test");
    }
}
