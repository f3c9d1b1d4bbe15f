//! Shared state handed to every request handler.

use std::path::PathBuf;
use std::sync::Arc;

use storyadmin::sanitize::redact_repo_url;
use storyadmin::{AdminSettings, AssetRegistry, ConfigStore, GitPublisher, PublishPipeline};

/// Everything the handlers need, created once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Authoritative configuration document.
    pub store: Arc<ConfigStore>,

    /// Uploaded images.
    pub assets: Arc<AssetRegistry>,

    /// Publishes the persisted document and uploads.
    pub pipeline: Arc<PublishPipeline>,

    /// Static admin UI served for every unmatched path.
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(
        store: Arc<ConfigStore>,
        assets: Arc<AssetRegistry>,
        pipeline: Arc<PublishPipeline>,
        public_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            assets,
            pipeline,
            public_dir: public_dir.into(),
        }
    }

    /// Wires the store, registry and git-backed pipeline from settings.
    /// The store is not loaded yet.
    pub fn from_settings(settings: AdminSettings) -> Self {
        let store = Arc::new(ConfigStore::new(
            settings.config_path,
            settings.fallback_config_path,
        ));
        let assets = Arc::new(AssetRegistry::new(settings.uploads_dir));

        let branch = settings.remote.branch.clone();
        let publisher = GitPublisher::new(settings.remote, settings.staging_dir);
        match publisher.remote_url() {
            Ok(url) => log::info!("Publishing to {} ({})", redact_repo_url(&url), branch),
            Err(e) => log::warn!("Publishing is not available: {}", e),
        }

        let pipeline = PublishPipeline::new(store.clone(), assets.clone(), Arc::new(publisher))
            .with_config_path(settings.published_config_path);

        Self::new(store, assets, Arc::new(pipeline), settings.public_dir)
    }
}
