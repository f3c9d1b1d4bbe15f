use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info_span, Instrument};

use crate::assets::AssetRegistry;
use crate::broadcast::PublishProgressBroadcaster;
use crate::document::ConfigStore;
use crate::settings::DEFAULT_PUBLISHED_CONFIG_PATH;

use super::bundle::PublishBundle;
use super::error::Result;
use super::progress::PublishPhase;
use super::publisher::{PublishReceipt, Publisher};

/// Commit message used when the caller supplies none.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update story configuration";

/// Snapshots the persisted configuration and the uploaded assets and
/// publishes them as one change.
///
/// At most one publish runs at a time; later callers wait for the lock.
pub struct PublishPipeline {
    store: Arc<ConfigStore>,
    assets: Arc<AssetRegistry>,
    publisher: Arc<dyn Publisher>,
    broadcaster: PublishProgressBroadcaster,
    config_path: String,
    publish_lock: Mutex<()>,
}

impl PublishPipeline {
    pub fn new(
        store: Arc<ConfigStore>,
        assets: Arc<AssetRegistry>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            store,
            assets,
            publisher,
            broadcaster: PublishProgressBroadcaster::default(),
            config_path: DEFAULT_PUBLISHED_CONFIG_PATH.to_string(),
            publish_lock: Mutex::new(()),
        }
    }

    /// Where the configuration lands inside the published repository.
    pub fn with_config_path(mut self, config_path: impl Into<String>) -> Self {
        self.config_path = config_path.into();
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: PublishProgressBroadcaster) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn broadcaster(&self) -> &PublishProgressBroadcaster {
        &self.broadcaster
    }

    /// Builds the bundle from what is currently on disk.
    pub async fn snapshot(&self) -> Result<PublishBundle> {
        let config_bytes = self.store.persisted_snapshot().await?;
        let assets = self.assets.list().await?;
        Ok(PublishBundle::assemble(
            self.config_path.clone(),
            config_bytes,
            assets,
        ))
    }

    /// Publishes the persisted configuration and all uploaded assets.
    pub async fn publish(&self, message: Option<&str>) -> Result<PublishReceipt> {
        let _guard = self.publish_lock.lock().await;

        let progress = self.broadcaster.start_publish();
        let message = resolve_commit_message(message);
        let span = info_span!("publish", operation_id = %progress.operation_id());

        async {
            progress.phase(PublishPhase::Starting, "Preparing publish...");

            let outcome: Result<PublishReceipt> = async {
                let bundle = self.snapshot().await?;
                log::info!(
                    "Publishing {} file(s) ({} asset(s))",
                    bundle.file_count(),
                    bundle.assets().len()
                );
                self.publisher.publish(&bundle, &message, &progress).await
            }
            .await;

            match &outcome {
                Ok(receipt) => {
                    match &receipt.commit_hash {
                        Some(hash) => progress.completed(&format!("Published {}", hash)),
                        None => progress.completed(&receipt.message),
                    }
                }
                Err(e) => {
                    log::error!("Publish failed: {}", e);
                    progress.failed(&e.to_string());
                }
            }

            outcome
        }
        .instrument(span)
        .await
    }
}

/// The caller's message, or [`DEFAULT_COMMIT_MESSAGE`] when it is blank.
pub fn resolve_commit_message(message: Option<&str>) -> String {
    message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_COMMIT_MESSAGE)
        .to_string()
}
