pub mod classify;
pub mod registry;

pub use classify::{classify_asset, AssetBucket};
pub use registry::{AssetRegistry, StoredAsset, UploadedAsset, UPLOADS_URL_PREFIX};
