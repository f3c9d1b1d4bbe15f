//! Pure data types for git operations.

use serde::{Deserialize, Serialize};

/// Result of a git commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    /// Status message.
    pub message: String,
    /// `None` when there was nothing to commit.
    pub commit_hash: Option<String>,
}

/// How the working tree branch relates to the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCheckout {
    /// Tracking an existing `origin/<branch>`.
    Tracking,
    /// Branch created locally from the default HEAD.
    Created,
    /// The remote is empty; the first commit creates the branch.
    Unborn,
}
