//! Publish-specific error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::{AssetError, ConfigError};

/// Errors that can occur while publishing a bundle.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("GitHub token not configured")]
    MissingCredentials,

    #[error("Remote repository unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote rejected the push: {0}")]
    RemoteConflict(String),

    /// The credential could not be handed to git.
    #[error("Git authentication setup failed: {0}")]
    GitAuthFailed(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("Git operation timed out after {0}s")]
    GitTimeout(u64),

    #[error("Failed to prepare staging area '{path}': {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to snapshot publish contents: {0}")]
    Snapshot(String),
}

impl From<ConfigError> for PublishError {
    fn from(err: ConfigError) -> Self {
        PublishError::Snapshot(err.to_string())
    }
}

impl From<AssetError> for PublishError {
    fn from(err: AssetError) -> Self {
        PublishError::Snapshot(err.to_string())
    }
}

impl PublishError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PublishError::MissingCredentials => "MISSING_CREDENTIALS",
            PublishError::RemoteUnavailable(_) => "REMOTE_UNAVAILABLE",
            PublishError::RemoteConflict(_) => "REMOTE_CONFLICT",
            PublishError::GitAuthFailed(_) => "GIT_AUTH_FAILED",
            PublishError::GitOperation(_) => "GIT_OPERATION_FAILED",
            PublishError::GitTimeout(_) => "GIT_TIMEOUT",
            PublishError::Staging { .. } => "STAGING_FAILED",
            PublishError::Snapshot(_) => "SNAPSHOT_FAILED",
        }
    }
}

/// Classifies git output into a more specific error variant.
///
/// Rejected pushes are conflicts; network and credential problems both mean
/// the remote is unavailable to us.
pub fn classify_git_error(stderr: &str) -> PublishError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();

    if lower.contains("[rejected]")
        || lower.contains("non-fast-forward")
        || lower.contains("fetch first")
        || lower.contains("failed to push some refs")
    {
        return PublishError::RemoteConflict(message);
    }

    if lower.contains("could not resolve host")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("network is unreachable")
        || lower.contains("unable to access")
        || lower.contains("failed to connect")
        || lower.contains("couldn't connect to server")
        || lower.contains("the remote end hung up unexpectedly")
        || lower.contains("repository not found")
        || lower.contains("does not appear to be a git repository")
        || lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("invalid username or password")
    {
        return PublishError::RemoteUnavailable(message);
    }

    PublishError::GitOperation(message)
}

/// Result type for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;
