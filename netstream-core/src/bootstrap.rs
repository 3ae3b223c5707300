//! Configuration loading

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::Config;

pub const CONFIG_PATH_ENV: &str = "NETSTREAM_CONFIG_PATH";

/// Load configuration from a config file and environment variables
///
/// Config file search order:
/// 1. `explicit_path` (from the command line), which must exist
/// 2. `NETSTREAM_CONFIG_PATH` environment variable
/// 3. ./config.yaml (current working directory)
/// 4. Fall back to environment variables only
pub fn load_config(explicit_path: Option<&str>) -> Result<Config> {
    let config_path = match explicit_path {
        Some(path) => {
            anyhow::ensure!(Path::new(path).exists(), "Config file not found: {path}");
            Some(path.to_string())
        }
        None => discover_config_path(),
    };

    let config = match &config_path {
        Some(path) => {
            eprintln!("Loading config from {path}");
            Config::from_file(path).with_context(|| format!("Failed to load {path}"))?
        }
        None => {
            eprintln!("No config file found, using environment variables");
            Config::from_env().context("Failed to load config from environment")?
        }
    };

    // Fail fast on misconfigurations
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    info!(path = config_path.as_deref().unwrap_or("<env>"), "Configuration loaded");
    Ok(config)
}

fn discover_config_path() -> Option<String> {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| Path::new(p).exists())
        .or_else(|| {
            let cwd = "config.yaml";
            Path::new(cwd).exists().then(|| cwd.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_explicit_file() {
        let file = write_config(
            "server:\n  http_port: 9100\nsignaling:\n  outbound_buffer: 500\n",
        );

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.http_port, 9100);
        assert_eq!(config.signaling.outbound_buffer, 500);
        // Unspecified sections keep their defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.signaling.ping_interval_seconds, 5);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load_config(Some("/nonexistent/netstream.yaml")).is_err());
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let file = write_config("logging:\n  format: xml\n");

        let err = load_config(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }
}
