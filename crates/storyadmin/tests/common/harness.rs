//! Test harness for isolated publish and store tests.
//!
//! Everything lives under one temporary directory: the local and fallback
//! configuration files, the uploads directory, the staging root and a bare
//! git repository acting as the remote.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use storyadmin::settings::RemoteSettings;
use storyadmin::{AssetRegistry, ConfigStore, GitPublisher, PublishPipeline};

pub const BRANCH: &str = "main";

pub struct TestHarness {
    temp_dir: TempDir,
    pub config_path: PathBuf,
    pub fallback_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub remote_dir: PathBuf,
}

impl TestHarness {
    /// Creates the directory layout and an empty bare remote.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().to_path_buf();

        let harness = Self {
            config_path: base.join("admin").join("story_remote.json"),
            fallback_path: base.join("story_remote.json"),
            uploads_dir: base.join("admin").join("uploads"),
            staging_dir: base.join("admin").join("temp"),
            remote_dir: base.join("remote.git"),
            temp_dir,
        };

        std::fs::create_dir_all(harness.config_path.parent().unwrap()).unwrap();
        git(&base, &["init", "--bare", "--quiet", "remote.git"]);
        harness
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes the shared bootstrap document.
    pub fn write_fallback(&self, document: &Value) {
        std::fs::write(
            &self.fallback_path,
            serde_json::to_string_pretty(document).unwrap(),
        )
        .unwrap();
    }

    /// A store bootstrapped from `document`.
    pub async fn loaded_store(&self, document: &Value) -> Arc<ConfigStore> {
        self.write_fallback(document);
        let store = Arc::new(ConfigStore::new(&self.config_path, &self.fallback_path));
        store.load().await.expect("store should load");
        store
    }

    pub fn registry(&self) -> Arc<AssetRegistry> {
        Arc::new(AssetRegistry::new(&self.uploads_dir))
    }

    pub fn remote_settings(&self) -> RemoteSettings {
        RemoteSettings {
            remote_url: Some(self.remote_dir.to_string_lossy().into_owned()),
            branch: BRANCH.to_string(),
            timeout_secs: Some(60),
            ..RemoteSettings::default()
        }
    }

    pub fn git_publisher(&self) -> GitPublisher {
        GitPublisher::new(self.remote_settings(), &self.staging_dir)
    }

    pub fn pipeline(&self, store: Arc<ConfigStore>) -> PublishPipeline {
        PublishPipeline::new(store, self.registry(), Arc::new(self.git_publisher()))
    }

    /// Commits `files` to the (empty) remote through a scratch clone.
    pub fn seed_remote(&self, files: &[(&str, &str)]) {
        let scratch = self.base().join("seed");
        git(
            self.base(),
            &["clone", "--quiet", self.remote_dir.to_str().unwrap(), "seed"],
        );
        git(
            &scratch,
            &["symbolic-ref", "HEAD", &format!("refs/heads/{}", BRANCH)],
        );
        for (path, content) in files {
            let target = scratch.join(path);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(target, content).unwrap();
        }
        git(&scratch, &["add", "-A"]);
        git(
            &scratch,
            &[
                "-c",
                "user.name=Seed",
                "-c",
                "user.email=seed@example.com",
                "-c",
                "commit.gpgsign=false",
                "commit",
                "--quiet",
                "-m",
                "Seed",
            ],
        );
        git(&scratch, &["push", "--quiet", "origin", BRANCH]);
        std::fs::remove_dir_all(&scratch).unwrap();
    }

    /// Installs a pre-receive hook that rejects every push.
    #[cfg(unix)]
    pub fn reject_pushes(&self) {
        use std::os::unix::fs::PermissionsExt;

        let hook = self.remote_dir.join("hooks").join("pre-receive");
        std::fs::write(&hook, "#!/bin/sh\necho 'pushes are frozen' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Contents of `path` at the tip of the remote branch.
    pub fn remote_file(&self, path: &str) -> Option<Vec<u8>> {
        let output = Command::new("git")
            .arg("--git-dir")
            .arg(&self.remote_dir)
            .args(["show", &format!("{}:{}", BRANCH, path)])
            .output()
            .unwrap();
        output.status.success().then_some(output.stdout)
    }

    pub fn remote_commit_count(&self) -> usize {
        let output = Command::new("git")
            .arg("--git-dir")
            .arg(&self.remote_dir)
            .args(["rev-list", "--count", BRANCH])
            .output()
            .unwrap();
        if !output.status.success() {
            return 0;
        }
        String::from_utf8_lossy(&output.stdout).trim().parse().unwrap()
    }

    /// `format` applied to the tip commit, e.g. `%s` or `%an <%ae>`.
    pub fn remote_head(&self, format: &str) -> String {
        let output = Command::new("git")
            .arg("--git-dir")
            .arg(&self.remote_dir)
            .args(["log", "-1", &format!("--format={}", format), BRANCH])
            .output()
            .unwrap();
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(&self.staging_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("git should be installed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}
