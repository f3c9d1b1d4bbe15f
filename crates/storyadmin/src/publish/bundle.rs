//! The set of files that make up one published change.

use std::path::{Path, PathBuf};

use crate::assets::{classify_asset, AssetBucket, StoredAsset};

/// An uploaded asset and where it lands in the published repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleAsset {
    pub bucket: AssetBucket,
    /// Repository-relative destination, e.g. `avatars/avatar-1-2.png`.
    pub destination: String,
    pub source: PathBuf,
}

/// Configuration bytes plus routed assets, written into a working tree as a
/// unit.
#[derive(Debug, Clone)]
pub struct PublishBundle {
    config_path: String,
    config_bytes: Vec<u8>,
    assets: Vec<BundleAsset>,
}

impl PublishBundle {
    /// Routes every asset by filename and pairs them with the configuration
    /// snapshot.
    pub fn assemble(
        config_path: impl Into<String>,
        config_bytes: Vec<u8>,
        assets: Vec<StoredAsset>,
    ) -> Self {
        let assets = assets
            .into_iter()
            .map(|asset| {
                let bucket = classify_asset(&asset.filename);
                BundleAsset {
                    destination: format!("{}/{}", bucket.dir_name(), asset.filename),
                    bucket,
                    source: asset.path,
                }
            })
            .collect();

        Self {
            config_path: config_path.into(),
            config_bytes,
            assets,
        }
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    pub fn config_bytes(&self) -> &[u8] {
        &self.config_bytes
    }

    pub fn assets(&self) -> &[BundleAsset] {
        &self.assets
    }

    /// Number of files the bundle writes.
    pub fn file_count(&self) -> usize {
        self.assets.len() + 1
    }

    /// Writes the configuration and copies every asset below `root`,
    /// creating bucket directories as needed. Existing files are overwritten.
    pub async fn write_into(&self, root: &Path) -> std::io::Result<usize> {
        let config_target = root.join(&self.config_path);
        if let Some(parent) = config_target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&config_target, &self.config_bytes).await?;

        for asset in &self.assets {
            let target = root.join(&asset.destination);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(&asset.source, &target).await?;
        }

        Ok(self.file_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stored(dir: &Path, name: &str) -> StoredAsset {
        let path = dir.join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        StoredAsset {
            filename: name.to_string(),
            path,
        }
    }

    #[test]
    fn test_assemble_routes_assets() {
        let dir = TempDir::new().unwrap();
        let bundle = PublishBundle::assemble(
            "story.json",
            b"{}".to_vec(),
            vec![
                stored(dir.path(), "avatar-173-991.png"),
                stored(dir.path(), "locationplace-1.png"),
                stored(dir.path(), "type-1-2.jpg"),
                stored(dir.path(), "random.png"),
            ],
        );

        let destinations: Vec<_> = bundle.assets().iter().map(|a| a.destination.as_str()).collect();
        assert_eq!(
            destinations,
            vec![
                "avatars/avatar-173-991.png",
                "places/locationplace-1.png",
                "types/type-1-2.jpg",
                "img/random.png",
            ]
        );
        assert_eq!(bundle.file_count(), 5);
    }

    #[tokio::test]
    async fn test_write_into_creates_tree() {
        let uploads = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let bundle = PublishBundle::assemble(
            "config/story.json",
            br#"{"version":"1.0"}"#.to_vec(),
            vec![stored(uploads.path(), "avatar-1-1.png")],
        );

        let written = bundle.write_into(target.path()).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            std::fs::read(target.path().join("config/story.json")).unwrap(),
            br#"{"version":"1.0"}"#
        );
        assert_eq!(
            std::fs::read(target.path().join("avatars/avatar-1-1.png")).unwrap(),
            b"avatar-1-1.png"
        );
    }

    #[tokio::test]
    async fn test_write_into_missing_source_fails() {
        let target = TempDir::new().unwrap();
        let bundle = PublishBundle::assemble(
            "story.json",
            b"{}".to_vec(),
            vec![StoredAsset {
                filename: "gone.png".to_string(),
                path: target.path().join("does-not-exist.png"),
            }],
        );

        assert!(bundle.write_into(target.path()).await.is_err());
    }
}
