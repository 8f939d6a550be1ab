//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{ApiConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ApiConfig, ConfigError> {
    load_config_with(path, |_| {})
}

/// Like [`load_config`], with `adjust` applied after the environment
/// overrides (command-line flags) and before validation.
pub fn load_config_with<F>(path: Option<&Path>, adjust: F) -> Result<ApiConfig, ConfigError>
where
    F: FnOnce(&mut ApiConfig),
{
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => ApiConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    adjust(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<ApiConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay environment settings onto `config`.
///
/// `lookup` abstracts the environment so callers (and tests) can supply
/// their own source instead of mutating process state.
pub fn apply_env_overrides<F>(config: &mut ApiConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(environment) = non_empty("ENVIRONMENT") {
        config.service.environment = environment;
    }
    if let Some(version) = non_empty("SERVICE_VERSION") {
        config.service.version = version;
    }
    if let Some(level) = non_empty("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = non_empty("LOG_FORMAT") {
        match format.to_lowercase().as_str() {
            "json" => config.logging.format = LogFormat::Json,
            "pretty" => config.logging.format = LogFormat::Pretty,
            other => tracing::warn!(format = %other, "Ignoring unknown LOG_FORMAT"),
        }
    }
    if let Some(addr) = non_empty("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(enabled) = non_empty("METRICS_ENABLED") {
        config.observability.metrics_enabled = matches!(enabled.as_str(), "1" | "true" | "TRUE" | "yes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ApiConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("ENVIRONMENT", "production"),
                ("LOG_LEVEL", "DEBUG"),
                ("LOG_FORMAT", "json"),
                ("METRICS_ENABLED", "true"),
            ]),
        );

        assert_eq!(config.service.environment, "production");
        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn test_unset_environment_defaults_to_development() {
        let mut config = ApiConfig::default();
        apply_env_overrides(&mut config, env(&[("ENVIRONMENT", "")]));
        assert_eq!(config.service.environment, "development");
        assert_eq!(config.service.version, "1.0.0");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ApiConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [service]
            environment = "staging"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
        assert_eq!(config.service.environment, "staging");
        assert_eq!(config.service.version, "1.0.0");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.cors.allow_origin, "*");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_adjusted_values_are_validated() {
        let err = load_config_with(None, |config| {
            config.listener.bind_address = "not-an-address".into();
        })
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_adjusted_values_win() {
        let config = load_config_with(None, |config| {
            config.listener.bind_address = "127.0.0.1:7000".into();
        })
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
    }
}
