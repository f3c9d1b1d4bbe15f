//! Hands the publishing token to git without putting it in a URL.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::publish::error::{PublishError, Result};

/// Escapes a token for safe use in single-quoted shell strings.
pub fn shell_escape_token(token: &str) -> String {
    token.replace('\'', "'\\''")
}

#[cfg(windows)]
fn escape_token_for_windows_batch(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len() * 2);
    for ch in token.chars() {
        match ch {
            '%' => escaped.push_str("%%"),
            '^' | '&' | '|' | '<' | '>' | '(' | ')' | '"' => {
                escaped.push('^');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Deletes the askpass script when dropped.
#[derive(Debug)]
pub struct AskpassCleanup {
    path: Option<PathBuf>,
}

impl AskpassCleanup {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn empty() -> Self {
        Self { path: None }
    }

    /// Location of the script, if one was written.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for AskpassCleanup {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Failed to clean up askpass script: {}", e);
            }
        }
    }
}

/// Environment for network git commands.
///
/// `_cleanup` must outlive the git child process.
#[derive(Debug)]
pub struct AuthEnv {
    pub env_vars: Vec<(String, String)>,
    pub _cleanup: AskpassCleanup,
}

impl AuthEnv {
    /// No credential: git must never prompt either way.
    pub fn anonymous() -> Self {
        Self {
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            _cleanup: AskpassCleanup::empty(),
        }
    }
}

/// Writes a one-shot `GIT_ASKPASS` script answering with `token` into
/// `script_dir`.
///
/// The script is created with owner-only permissions and removed when the
/// returned [`AuthEnv`] is dropped.
pub fn build_auth_env(token: Option<&SecretString>, script_dir: &Path) -> Result<AuthEnv> {
    let Some(token) = token else {
        return Ok(AuthEnv::anonymous());
    };

    let random_suffix = uuid::Uuid::new_v4().to_string();

    #[cfg(unix)]
    let (askpass_path, askpass_script) = {
        let path = script_dir.join(format!(".git-askpass-{}.sh", random_suffix));
        let script = format!(
            "#!/bin/sh\necho '{}'\n",
            shell_escape_token(token.expose_secret())
        );
        (path, script)
    };

    #[cfg(windows)]
    let (askpass_path, askpass_script) = {
        let path = script_dir.join(format!(".git-askpass-{}.bat", random_suffix));
        let escaped = escape_token_for_windows_batch(token.expose_secret());
        let script = format!("@echo off\r\necho {}\r\n", escaped);
        (path, script)
    };

    let io_err = |e: std::io::Error| {
        PublishError::GitAuthFailed(format!("Failed to write askpass script: {}", e))
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o700)
            .open(&askpass_path)
            .map_err(io_err)?;
        std::io::Write::write_all(&mut file, askpass_script.as_bytes()).map_err(io_err)?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(&askpass_path, &askpass_script).map_err(io_err)?;
    }

    let cleanup = AskpassCleanup::new(askpass_path.clone());

    let askpass_path_str = askpass_path
        .to_str()
        .ok_or_else(|| {
            PublishError::GitAuthFailed(
                "Askpass script path contains non-UTF8 characters".to_string(),
            )
        })?
        .to_string();

    Ok(AuthEnv {
        env_vars: vec![
            ("GIT_ASKPASS".to_string(), askpass_path_str),
            ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
        ],
        _cleanup: cleanup,
    })
}
