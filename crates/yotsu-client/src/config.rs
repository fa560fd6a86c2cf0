use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::DEFAULT_PAGE_SIZE;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
const DEFAULT_DB_PATH: &str = "yotsu.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

/// Runtime settings, read from `YOTSU_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub ws_url: String,
    pub db_path: PathBuf,
    pub page_size: u32,
    pub email: Option<String>,
    pub password: Option<String>,
    pub totp_code: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            email: None,
            password: None,
            totp_code: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset and empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let page_size = match get("YOTSU_PAGE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or(ConfigError::InvalidNumber {
                    key: "YOTSU_PAGE_SIZE",
                    value: raw,
                })?,
            None => defaults.page_size,
        };

        Ok(Self {
            api_url: get("YOTSU_API_URL").unwrap_or(defaults.api_url),
            ws_url: get("YOTSU_WS_URL").unwrap_or(defaults.ws_url),
            db_path: get("YOTSU_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            page_size,
            email: get("YOTSU_EMAIL"),
            password: get("YOTSU_PASSWORD"),
            totp_code: get("YOTSU_TOTP_CODE"),
        })
    }
}
