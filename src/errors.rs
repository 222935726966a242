//! Defines the custom error types used throughout the `arena-frame` application.
//!
//! This module centralizes error handling, providing specific error enums for
//! different categories of issues (configuration, Are.na API interactions,
//! image fetching/decoding). Each error type implements `Debug`, `Display`,
//! and `std::error::Error`, and provides `From` implementations for common
//! underlying error types.

use std::error::Error as StdError;
use std::fmt;

// --- ConfigError ---
/// Errors raised while loading the INI configuration file.
#[must_use = "a configuration error should be handled or propagated"]
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration file content could not be parsed as INI.
    Parse(String),
    /// A required key was absent from the `[settings]` section.
    MissingKey(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config file I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Config file parse error: {}", e),
            ConfigError::MissingKey(key) => write!(f, "Required config key '{}' not found", key),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(_) | ConfigError::MissingKey(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

// --- ApiError ---
/// Errors related to calls against the Are.na REST API.
///
/// Malformed upstream JSON (`Json`) is deliberately distinct from a failed
/// request (`Http`/`Request`): the former means the call itself succeeded but
/// the body could not be interpreted.
#[must_use = "an API error should be handled or propagated"]
#[derive(Debug)]
pub enum ApiError {
    /// A network-level error occurred during an HTTP request made by `reqwest`.
    Request(reqwest::Error),
    /// The upstream response body was not the JSON shape we expected.
    Json(serde_json::Error),
    /// The upstream API answered with a non-success status code.
    Http {
        status: reqwest::StatusCode,
        body: String,
    },
    /// A required request parameter was missing or empty; no network call was made.
    MissingParam(&'static str),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Request(e) => write!(f, "Are.na request error: {}", e),
            ApiError::Json(e) => write!(f, "Are.na response JSON error: {}", e),
            ApiError::Http { status, body } => {
                write!(f, "Are.na upstream error {}: {}", status, body)
            }
            ApiError::MissingParam(name) => write!(f, "Missing request parameter: '{}'", name),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Request(e) => Some(e),
            ApiError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Request(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Json(err)
    }
}

// --- MediaError ---
/// Errors related to fetching and decoding block images.
#[must_use = "a media error should be handled or propagated"]
#[derive(Debug)]
pub enum MediaError {
    /// An error occurred during the download of image content.
    Download(reqwest::Error),
    /// An error occurred while decoding image bytes via the `image` crate.
    Decode(image::ImageError),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Download(e) => write!(f, "Image download error: {}", e),
            MediaError::Decode(e) => write!(f, "Image decode error: {}", e),
        }
    }
}

impl StdError for MediaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MediaError::Download(e) => Some(e),
            MediaError::Decode(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        MediaError::Download(err)
    }
}

impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self {
        MediaError::Decode(err)
    }
}
