use async_trait::async_trait;
use serde::Serialize;

use super::bundle::PublishBundle;
use super::error::Result;
use super::progress::PublishProgress;

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    /// `None` when the remote already held identical content.
    pub commit_hash: Option<String>,
    pub files_staged: usize,
    pub pushed: bool,
    pub message: String,
}

impl PublishReceipt {
    /// Receipt for a publish that found nothing to change.
    pub fn unchanged(files_staged: usize) -> Self {
        Self {
            commit_hash: None,
            files_staged,
            pushed: false,
            message: "No changes to publish".to_string(),
        }
    }
}

/// Delivers a bundle to versioned storage as one atomic change.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        bundle: &PublishBundle,
        message: &str,
        progress: &PublishProgress,
    ) -> Result<PublishReceipt>;
}
