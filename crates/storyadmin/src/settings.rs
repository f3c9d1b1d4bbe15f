//! Service settings read from the process environment.
//!
//! Every setting has a default so the service starts with no environment at
//! all; publishing is the only feature that needs real values
//! (`GITHUB_TOKEN`, `GITHUB_OWNER`, `GITHUB_REPO`).

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use crate::secrets::{resolve_secret_optional, SecretError};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_GIT_USER_NAME: &str = "Config Service";
pub const DEFAULT_GIT_USER_EMAIL: &str = "config@imaginelabs.com";
pub const DEFAULT_PUBLISHED_CONFIG_PATH: &str = "story.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to resolve GitHub token: {0}")]
    Secret(#[from] SecretError),
}

/// Where and as whom to publish.
#[derive(Debug)]
pub struct RemoteSettings {
    pub token: Option<SecretString>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: String,
    /// Full remote URL; takes precedence over owner/repo.
    pub remote_url: Option<String>,
    pub user_name: String,
    pub user_email: String,
    /// Per git command timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            branch: DEFAULT_BRANCH.to_string(),
            remote_url: None,
            user_name: DEFAULT_GIT_USER_NAME.to_string(),
            user_email: DEFAULT_GIT_USER_EMAIL.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug)]
pub struct AdminSettings {
    pub port: u16,
    pub bind_address: String,
    pub config_path: PathBuf,
    pub fallback_config_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub public_dir: PathBuf,
    pub staging_dir: PathBuf,
    /// Path of the configuration file inside the published repository.
    pub published_config_path: String,
    pub remote: RemoteSettings,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            config_path: PathBuf::from("story_remote.json"),
            fallback_config_path: PathBuf::from("../story_remote.json"),
            uploads_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            staging_dir: PathBuf::from("temp"),
            published_config_path: DEFAULT_PUBLISHED_CONFIG_PATH.to_string(),
            remote: RemoteSettings::default(),
        }
    }
}

impl AdminSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => defaults.port,
        };

        let timeout_secs = match get("GIT_TIMEOUT_SECS") {
            Some(raw) => match parse_number::<u64>("GIT_TIMEOUT_SECS", &raw)? {
                0 => None,
                secs => Some(secs),
            },
            None => None,
        };

        let token = resolve_secret_optional(
            get("GITHUB_TOKEN").as_deref(),
            get("GITHUB_TOKEN_FILE").as_deref(),
        )?;

        let remote = RemoteSettings {
            token,
            owner: get("GITHUB_OWNER"),
            repo: get("GITHUB_REPO"),
            branch: get("GITHUB_BRANCH").unwrap_or(defaults.remote.branch),
            remote_url: get("REMOTE_URL"),
            user_name: get("GIT_USER_NAME").unwrap_or(defaults.remote.user_name),
            user_email: get("GIT_USER_EMAIL").unwrap_or(defaults.remote.user_email),
            timeout_secs,
        };

        Ok(Self {
            port,
            bind_address: get("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            config_path: get("CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            fallback_config_path: get("FALLBACK_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.fallback_config_path),
            uploads_dir: get("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            public_dir: get("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            staging_dir: get("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            published_config_path: get("PUBLISHED_CONFIG_PATH")
                .map(|p| p.trim_start_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.published_config_path),
            remote,
        })
    }

    /// `bind_address:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| SettingsError::InvalidValue {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
