//! Storage for uploaded binary assets.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::AssetError;

/// URL prefix uploaded assets are served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Default filename prefix when the upload carries no category.
const DEFAULT_PREFIX: &str = "file";

/// Attempts before giving up on finding an unused filename.
const MAX_NAME_ATTEMPTS: u32 = 16;

/// An asset written to the uploads directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    /// Generated, unique filename inside the uploads directory.
    pub stored_filename: String,
    /// Filename as supplied by the uploader.
    pub original_filename: String,
    /// URL under which the asset is served.
    pub served_url: String,
}

/// A file currently present in the uploads directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub filename: String,
    pub path: PathBuf,
}

/// Accepts uploaded files and hands out stable references to them.
///
/// Files are never deleted here; orphaned uploads stay until removed by hand.
pub struct AssetRegistry {
    uploads_dir: PathBuf,
}

impl AssetRegistry {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Writes `content` under a freshly generated name.
    ///
    /// `category` becomes the filename prefix (`avatar`, `place`, `type`, ...)
    /// which later decides the published directory. The content is written
    /// to a hidden temporary file first and only then linked under its final
    /// name, so [`AssetRegistry::list`] never sees a partial upload.
    pub async fn store(
        &self,
        content: &[u8],
        original_filename: &str,
        category: Option<&str>,
    ) -> Result<UploadedAsset, AssetError> {
        if content.is_empty() {
            return Err(AssetError::Empty);
        }

        tokio::fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(|e| AssetError::CreateDirectory {
                path: self.uploads_dir.clone(),
                source: e,
            })?;

        let prefix = category
            .map(sanitize_component)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let extension = extension_of(original_filename);

        let tmp_path = self
            .uploads_dir
            .join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        write_new(&tmp_path, content)
            .await
            .map_err(|e| AssetError::WriteFile {
                path: tmp_path.clone(),
                source: e,
            })?;

        let claimed = self.claim_name(&tmp_path, &prefix, &extension).await;
        let _ = tokio::fs::remove_file(&tmp_path).await;
        let stored_filename = claimed?;

        log::info!(
            "Stored upload '{}' as {} ({} bytes)",
            original_filename,
            stored_filename,
            content.len()
        );

        Ok(UploadedAsset {
            served_url: format!("{}/{}", UPLOADS_URL_PREFIX, stored_filename),
            stored_filename,
            original_filename: original_filename.to_string(),
        })
    }

    /// Links the finished temporary file under an unused generated name.
    /// Linking fails rather than replacing an existing file.
    async fn claim_name(
        &self,
        tmp_path: &Path,
        prefix: &str,
        extension: &str,
    ) -> Result<String, AssetError> {
        let mut last_path = self.uploads_dir.clone();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let stored_filename = generate_filename(prefix, extension);
            let path = self.uploads_dir.join(&stored_filename);

            match tokio::fs::hard_link(tmp_path, &path).await {
                Ok(()) => return Ok(stored_filename),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => last_path = path,
                Err(e) => return Err(AssetError::WriteFile { path, source: e }),
            }
        }

        Err(AssetError::WriteFile {
            path: last_path,
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "could not find an unused filename",
            ),
        })
    }

    /// Lists every regular file in the uploads directory, sorted by name.
    /// Hidden files (in-flight uploads among them) are skipped.
    pub async fn list(&self) -> Result<Vec<StoredAsset>, AssetError> {
        let read_err = |source| AssetError::ReadDirectory {
            path: self.uploads_dir.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.uploads_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_err(e)),
        };

        let mut assets = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let file_type = entry.file_type().await.map_err(read_err)?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !file_type.is_file() || filename.starts_with('.') {
                continue;
            }
            assets.push(StoredAsset {
                filename,
                path: entry.path(),
            });
        }

        assets.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(assets)
    }
}

async fn write_new(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let written = async {
        file.write_all(content).await?;
        file.flush().await
    }
    .await;
    if written.is_err() {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
    }
    written
}

/// `<prefix>-<unix millis>-<random 9 digits><.ext>`
fn generate_filename(prefix: &str, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("{}-{}-{}{}", prefix, millis, random, extension)
}

/// Returns `.ext` of the original filename, or an empty string.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| sanitize_component(&ext.to_string_lossy()))
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Keeps ASCII letters, digits, `-` and `_`.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
