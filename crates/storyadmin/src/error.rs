use std::path::PathBuf;
use thiserror::Error;

pub use crate::publish::error::PublishError;
pub use crate::settings::SettingsError;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upload error: {0}")]
    Asset(#[from] AssetError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Edit session error: {0}")]
    Session(#[from] SessionError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration not loaded")]
    NotLoaded,

    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON in '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No readable configuration at '{local}' or '{fallback}': {reason}")]
    Bootstrap {
        local: PathBuf,
        fallback: PathBuf,
        reason: String,
    },

    #[error("Failed to serialize config JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("No file uploaded")]
    Empty,

    #[error("Failed to create upload directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write uploaded file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read upload directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{collection} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Configuration does not match the document shape: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("Invalid JSON: {0}")]
    InvalidRawJson(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded with {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, AdminError>;
