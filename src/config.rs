//! Handles application configuration loading.
//!
//! This module defines the `AppConfig` struct which holds the OAuth
//! application credentials and the upstream endpoints, and provides the
//! `load_config` function to read these settings from an INI file.

use super::errors::ConfigError;
use configparser::ini::Ini;
use log::{debug, error, info};

pub const DEFAULT_API_URL: &str = "https://api.are.na/v2";
pub const DEFAULT_AUTH_URL: &str = "https://dev.are.na/oauth";

/// Holds the application's configuration parameters.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// OAuth2 application id registered with Are.na.
    pub client_id: String,
    /// OAuth2 application secret.
    pub client_secret: String,
    /// Redirect URI, exactly as registered for the authorize step.
    pub redirect_uri: String,
    /// Base URL of the Are.na REST API.
    pub api_url: String,
    /// Base URL of the Are.na OAuth endpoints.
    pub auth_url: String,
}

impl AppConfig {
    /// URL the user opens in a browser to obtain an authorization code.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&response_type=code",
            self.auth_url, self.client_id, self.redirect_uri
        )
    }
}

/// Loads application configuration from the specified INI file path.
///
/// Reads settings from the `[settings]` section. `client_id`,
/// `client_secret` and `redirect_uri` are required; `api_url` and
/// `auth_url` fall back to the public Are.na endpoints.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, is malformed,
/// or if a required key is missing.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Attempting to load config from: {}", path);
    let mut config_parser = Ini::new();

    config_parser.load(path).map_err(|e| {
        error!("Error loading config file '{}': {}", path, e);
        if e.to_lowercase().contains("os error 2") || e.to_lowercase().contains("no such file") {
            ConfigError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, e))
        } else {
            ConfigError::Parse(e)
        }
    })?;

    let get_required = |key_name: &str| {
        config_parser.get("settings", key_name).ok_or_else(|| {
            error!(
                "Missing configuration key '{}' in section '[settings]' of file '{}'",
                key_name, path
            );
            ConfigError::MissingKey(key_name.to_string())
        })
    };

    let client_id = get_required("client_id")?;
    let client_secret = get_required("client_secret")?;
    let redirect_uri = get_required("redirect_uri")?;
    let api_url = config_parser
        .get("settings", "api_url")
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let auth_url = config_parser
        .get("settings", "auth_url")
        .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string());
    debug!(
        "Loaded config: client_id={}, redirect_uri={}, api_url={}, auth_url={}",
        client_id, redirect_uri, api_url, auth_url
    );

    let app_config = AppConfig {
        client_id,
        client_secret,
        redirect_uri,
        api_url,
        auth_url,
    };
    info!("Configuration loaded successfully from {}", path);
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let path = write_temp_config(
            "arena_frame_config_full.conf",
            "[settings]\nclient_id = abc\nclient_secret = shh\nredirect_uri = https://localhost\napi_url = http://api.test/v2\nauth_url = http://auth.test/oauth\n",
        );
        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.client_secret, "shh");
        assert_eq!(config.redirect_uri, "https://localhost");
        assert_eq!(config.api_url, "http://api.test/v2");
        assert_eq!(config.auth_url, "http://auth.test/oauth");
    }

    #[test]
    fn test_endpoint_defaults() {
        let path = write_temp_config(
            "arena_frame_config_defaults.conf",
            "[settings]\nclient_id = abc\nclient_secret = shh\nredirect_uri = https://localhost\n",
        );
        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_missing_key() {
        let path = write_temp_config(
            "arena_frame_config_missing.conf",
            "[settings]\nclient_id = abc\n",
        );
        match load_config(path.to_str().unwrap()) {
            Err(ConfigError::MissingKey(key)) => assert_eq!(key, "client_secret"),
            other => panic!("expected MissingKey, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_file() {
        match load_config("/nonexistent/arena-frame.conf") {
            Err(ConfigError::Io(_)) | Err(ConfigError::Parse(_)) => {}
            other => panic!("expected load failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_authorize_url() {
        let config = AppConfig {
            client_id: "abc".into(),
            client_secret: "shh".into(),
            redirect_uri: "https://localhost".into(),
            api_url: DEFAULT_API_URL.into(),
            auth_url: DEFAULT_AUTH_URL.into(),
        };
        assert_eq!(
            config.authorize_url(),
            "https://dev.are.na/oauth/authorize?client_id=abc&redirect_uri=https://localhost&response_type=code"
        );
    }
}
