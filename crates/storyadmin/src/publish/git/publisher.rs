//! [`Publisher`] backed by the git command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::Instrument;

use super::auth::build_auth_env;
use super::repository::GitRepository;
use crate::publish::bundle::PublishBundle;
use crate::publish::error::{PublishError, Result};
use crate::publish::progress::{PublishPhase, PublishProgress};
use crate::publish::publisher::{PublishReceipt, Publisher};
use crate::sanitize::{redact_path, redact_repo_url};
use crate::settings::RemoteSettings;

/// Publishes by cloning the remote into a throwaway staging directory,
/// committing the bundle and pushing it back.
pub struct GitPublisher {
    remote: RemoteSettings,
    staging_root: PathBuf,
}

impl GitPublisher {
    pub fn new(remote: RemoteSettings, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            staging_root: staging_root.into(),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// The URL git talks to. Never carries the token itself.
    pub fn remote_url(&self) -> Result<String> {
        if let Some(url) = &self.remote.remote_url {
            return Ok(url.clone());
        }

        if self.remote.token.is_none() {
            return Err(PublishError::MissingCredentials);
        }

        match (self.remote.owner.as_deref(), self.remote.repo.as_deref()) {
            (Some(owner), Some(repo)) => Ok(format!(
                "https://x-access-token@github.com/{}/{}.git",
                owner, repo
            )),
            _ => Err(PublishError::RemoteUnavailable(
                "GitHub owner and repository are not configured".to_string(),
            )),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.remote.timeout_secs.map(Duration::from_secs)
    }

    async fn create_staging_dir(&self) -> Result<TempDir> {
        tokio::fs::create_dir_all(&self.staging_root)
            .await
            .map_err(|e| PublishError::Staging {
                path: self.staging_root.clone(),
                source: e,
            })?;

        tempfile::Builder::new()
            .prefix("publish-")
            .tempdir_in(&self.staging_root)
            .map_err(|e| PublishError::Staging {
                path: self.staging_root.clone(),
                source: e,
            })
    }

    async fn publish_in(
        &self,
        workdir: &Path,
        url: &str,
        bundle: &PublishBundle,
        message: &str,
        progress: &PublishProgress,
    ) -> Result<PublishReceipt> {
        let branch = self.remote.branch.as_str();
        // The askpass script lives next to the clone, never inside it.
        let auth = build_auth_env(self.remote.token.as_ref(), &self.staging_root)?;

        progress.phase(PublishPhase::Cloning, "Cloning repository...");
        let repo = GitRepository::clone_into(url, workdir, self.timeout(), &auth, progress).await?;

        progress.phase(PublishPhase::CheckingOut, &format!("Checking out {}...", branch));
        let checkout = repo.checkout_branch(branch).await?;
        log::debug!("Checked out {} ({:?})", branch, checkout);

        progress.phase(PublishPhase::Copying, "Copying files...");
        let files_staged = bundle
            .write_into(repo.repo_path())
            .await
            .map_err(|e| PublishError::Staging {
                path: workdir.to_path_buf(),
                source: e,
            })?;

        progress.phase(PublishPhase::StagingFiles, "Staging files...");
        repo.configure_identity(&self.remote.user_name, &self.remote.user_email)
            .await?;
        let changed = repo.stage_all().await?;
        if changed.is_empty() {
            log::info!("Remote already up to date, skipping commit and push");
            return Ok(PublishReceipt::unchanged(files_staged));
        }

        progress.phase(PublishPhase::Committing, "Creating commit...");
        let commit = repo.commit(message).await?;
        let Some(commit_hash) = commit.commit_hash else {
            return Ok(PublishReceipt::unchanged(files_staged));
        };

        progress.phase(PublishPhase::Pushing, &format!("Pushing to {}...", branch));
        repo.push(branch, &auth, progress).await?;
        drop(auth);

        log::info!(
            "Published {} changed file(s) to {} as {}",
            changed.len(),
            branch,
            commit_hash
        );

        Ok(PublishReceipt {
            commit_hash: Some(commit_hash),
            files_staged,
            pushed: true,
            message: commit.message,
        })
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(
        &self,
        bundle: &PublishBundle,
        message: &str,
        progress: &PublishProgress,
    ) -> Result<PublishReceipt> {
        let url = self.remote_url()?;
        let span = tracing::info_span!(
            "git_publish",
            remote = %redact_repo_url(&url),
            branch = %self.remote.branch,
        );

        async {
            let staging = self.create_staging_dir().await?;
            let result = self
                .publish_in(staging.path(), &url, bundle, message, progress)
                .await;

            progress.phase(PublishPhase::CleaningUp, "Cleaning up...");
            let staging_path = staging.path().to_path_buf();
            if let Err(e) = staging.close() {
                log::warn!(
                    "Failed to remove staging directory {}: {}",
                    redact_path(&staging_path),
                    e
                );
            }

            result
        }
        .instrument(span)
        .await
    }
}
