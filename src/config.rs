//! Configuration module for environment variables and application settings

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

/// Backend used when no base URL is configured
pub const DEFAULT_API_BASE_URL: &str =
    "https://assetshareapi-a8c6f5abbfg9ftbw.northeurope-01.azurewebsites.net/api";

pub const API_BASE_URL_VAR: &str = "ASSETSHARE_API_BASE_URL";
pub const SESSION_FILE_VAR: &str = "ASSETSHARE_SESSION_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL without a trailing slash
    pub api_base_url: String,

    /// File holding the persisted session
    pub session_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base_url = normalize_base_url(
            &lookup(API_BASE_URL_VAR).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;

        let session_file = lookup(SESSION_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                lookup("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_default()
                    .join(".assetshare")
                    .join("session.json")
            });

        Ok(Self {
            api_base_url,
            session_file,
        })
    }
}

/// Strip one trailing slash and make sure what is left is an absolute URL
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let base = raw.strip_suffix('/').unwrap_or(raw);
    Url::parse(base).with_context(|| format!("{API_BASE_URL_VAR} is not a valid URL: {raw}"))?;
    Ok(base.to_string())
}
