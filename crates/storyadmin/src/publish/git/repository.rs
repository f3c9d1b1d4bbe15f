//! Git working tree operations used by the publisher.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::auth::AuthEnv;
use super::parse::{changed_paths, format_git_error, progress_segments};
use super::types::{BranchCheckout, CommitResult};
use crate::publish::error::{classify_git_error, PublishError, Result};
use crate::publish::progress::PublishProgress;
use crate::sanitize::redact_repo_url;

/// A cloned working tree.
pub struct GitRepository {
    repo_path: PathBuf,
    timeout: Option<Duration>,
}

impl GitRepository {
    /// Wraps an existing working tree.
    pub fn new(repo_path: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            repo_path: repo_path.into(),
            timeout,
        }
    }

    /// Clones `url` into the empty directory `dest`.
    ///
    /// Any failure other than a timeout is reported as
    /// [`PublishError::RemoteUnavailable`]: nothing has been changed yet.
    pub async fn clone_into(
        url: &str,
        dest: &Path,
        timeout: Option<Duration>,
        auth: &AuthEnv,
        progress: &PublishProgress,
    ) -> Result<Self> {
        log::debug!("Cloning {} into staging area", redact_repo_url(url));

        let mut cmd = Command::new("git");
        cmd.current_dir(dest)
            .args(["clone", "--progress", url, "."])
            .envs(auth.env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let (status, stderr) = with_timeout(timeout, run_streaming(cmd, progress)).await?;
        if !status.success() {
            return Err(PublishError::RemoteUnavailable(format!(
                "Failed to clone {}: {}",
                redact_repo_url(url),
                stderr.trim()
            )));
        }

        Ok(Self::new(dest, timeout))
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Whether the clone knows `origin/<branch>`.
    pub async fn remote_branch_exists(&self, branch: &str) -> Result<bool> {
        let remote_ref = format!("refs/remotes/origin/{}", branch);
        let output = self
            .run_git(&["rev-parse", "--verify", "--quiet", &remote_ref])
            .await?;
        Ok(output.status.success())
    }

    /// Whether HEAD points at a commit.
    pub async fn has_commits(&self) -> Result<bool> {
        let output = self
            .run_git(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await?;
        Ok(output.status.success())
    }

    /// Checks out `branch`, tracking the remote branch when there is one.
    pub async fn checkout_branch(&self, branch: &str) -> Result<BranchCheckout> {
        if self.remote_branch_exists(branch).await? {
            let remote_ref = format!("origin/{}", branch);
            self.run_git_checked(&["checkout", "-B", branch, &remote_ref])
                .await?;
            return Ok(BranchCheckout::Tracking);
        }

        if self.has_commits().await? {
            self.run_git_checked(&["checkout", "-B", branch]).await?;
            return Ok(BranchCheckout::Created);
        }

        let head_ref = format!("refs/heads/{}", branch);
        self.run_git_checked(&["symbolic-ref", "HEAD", &head_ref])
            .await?;
        Ok(BranchCheckout::Unborn)
    }

    /// Sets the commit identity for this working tree only.
    pub async fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run_git_checked(&["config", "user.name", name]).await?;
        self.run_git_checked(&["config", "user.email", email])
            .await?;
        Ok(())
    }

    /// Stages every change and returns the paths that differ from HEAD.
    pub async fn stage_all(&self) -> Result<Vec<String>> {
        self.run_git_checked(&["add", "-A"]).await?;
        let output = self.run_git_checked(&["status", "--porcelain"]).await?;
        Ok(changed_paths(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Commits the index. A clean index yields no commit rather than an error.
    pub async fn commit(&self, message: &str) -> Result<CommitResult> {
        let status = self.run_git_checked(&["status", "--porcelain"]).await?;
        if changed_paths(&String::from_utf8_lossy(&status.stdout)).is_empty() {
            return Ok(CommitResult {
                message: "Nothing to commit".to_string(),
                commit_hash: None,
            });
        }

        let output = self
            .run_git_checked(&["-c", "commit.gpgsign=false", "commit", "-m", message])
            .await?;

        let hash_output = self.run_git_checked(&["rev-parse", "HEAD"]).await?;
        let commit_hash = String::from_utf8_lossy(&hash_output.stdout)
            .trim()
            .to_string();

        Ok(CommitResult {
            message: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            commit_hash: Some(commit_hash),
        })
    }

    /// Pushes `branch` to origin, streaming transfer progress.
    pub async fn push(
        &self,
        branch: &str,
        auth: &AuthEnv,
        progress: &PublishProgress,
    ) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path)
            .args(["push", "--progress", "origin", branch])
            .envs(auth.env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let (status, stderr) = with_timeout(self.timeout, run_streaming(cmd, progress)).await?;
        if status.success() {
            Ok(())
        } else if stderr.trim().is_empty() {
            Err(PublishError::GitOperation(format!(
                "Push failed with exit code {}",
                status.code().unwrap_or(-1)
            )))
        } else {
            Err(classify_git_error(&stderr))
        }
    }

    async fn run_git(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        with_timeout(self.timeout, async {
            cmd.output()
                .await
                .map_err(|e| PublishError::GitOperation(format!("Failed to run git: {}", e)))
        })
        .await
    }

    async fn run_git_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run_git(args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(PublishError::GitOperation(format!(
                "git {}: {}",
                args.first().copied().unwrap_or_default(),
                format_git_error(&output)
            )))
        }
    }
}

/// Runs a git command, forwarding stderr progress and collecting stderr for
/// error reporting.
async fn run_streaming(mut cmd: Command, progress: &PublishProgress) -> Result<(ExitStatus, String)> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| PublishError::GitOperation(format!("Failed to run git: {}", e)))?;

    let stderr_pipe = child.stderr.take();
    let stdout_pipe = child.stdout.take();

    let stderr_task = async {
        let mut collected = String::new();
        if let Some(stderr) = stderr_pipe {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                for segment in progress_segments(&line) {
                    progress.git_output(segment);
                }
                collected.push_str(&line);
                collected.push('\n');
            }
        }
        collected
    };

    let stdout_task = async {
        if let Some(stdout) = stdout_pipe {
            let mut lines = BufReader::new(stdout).lines();
            // Drain so the pipe never fills up.
            while let Ok(Some(_line)) = lines.next_line().await {}
        }
    };

    let (stderr_text, ()) = tokio::join!(stderr_task, stdout_task);

    let status = child
        .wait()
        .await
        .map_err(|e| PublishError::GitOperation(e.to_string()))?;

    Ok((status, stderr_text))
}

async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| PublishError::GitTimeout(limit.as_secs()))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .current_dir(dir)
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn init_repo(dir: &Path) -> GitRepository {
        git(dir, &["init", "--quiet"]);
        GitRepository::new(dir, None)
    }

    #[tokio::test]
    async fn test_unborn_checkout_and_commit() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());

        assert!(!repo.has_commits().await.unwrap());
        assert_eq!(
            repo.checkout_branch("content").await.unwrap(),
            BranchCheckout::Unborn
        );
        repo.configure_identity("Config Service", "config@imaginelabs.com")
            .await
            .unwrap();

        std::fs::write(dir.path().join("story.json"), "{}").unwrap();
        let changed = repo.stage_all().await.unwrap();
        assert_eq!(changed, vec!["story.json"]);

        let result = repo.commit("Update story configuration").await.unwrap();
        let hash = result.commit_hash.unwrap();
        assert_eq!(hash.len(), 40);
        assert!(repo.has_commits().await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_clean_tree_is_noop() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        repo.configure_identity("Test", "test@test.com").await.unwrap();

        assert!(repo.stage_all().await.unwrap().is_empty());
        let result = repo.commit("nothing").await.unwrap();
        assert!(result.commit_hash.is_none());
        assert_eq!(result.message, "Nothing to commit");
    }

    #[tokio::test]
    async fn test_checked_command_reports_failure() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());

        let err = repo
            .run_git_checked(&["checkout", "no-such-branch"])
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::GitOperation(_)));
    }

    #[tokio::test]
    async fn test_clone_missing_remote_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let progress = crate::broadcast::PublishProgressBroadcaster::default().start_publish();
        let missing = dir.path().join("missing.git");

        let result = GitRepository::clone_into(
            missing.to_str().unwrap(),
            dir.path(),
            None,
            &AuthEnv::anonymous(),
            &progress,
        )
        .await;

        assert!(matches!(result, Err(PublishError::RemoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_timeout_yields_git_timeout() {
        let result: Result<()> = with_timeout(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(PublishError::GitTimeout(0))));
    }
}
