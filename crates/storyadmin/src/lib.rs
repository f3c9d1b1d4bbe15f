pub mod api;
pub mod assets;
pub mod broadcast;
pub mod client;
pub mod document;
pub mod error;
pub mod publish;
pub mod sanitize;
pub mod secrets;
pub mod session;
pub mod settings;

pub use assets::{classify_asset, AssetBucket, AssetRegistry, UploadedAsset};
pub use broadcast::PublishProgressBroadcaster;
pub use client::AdminClient;
pub use document::{ConfigStore, ConfigurationDocument};
pub use error::{
    AdminError, AssetError, ClientError, ConfigError, PublishError, Result, SessionError,
    SettingsError,
};
pub use publish::{
    GitPublisher, PublishBundle, PublishPipeline, PublishProgressEvent, PublishReceipt, Publisher,
};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use session::{ConfigBackend, EditSession, ImagePrompt, ImageTarget, StoryPrompt};
pub use settings::{AdminSettings, RemoteSettings};
