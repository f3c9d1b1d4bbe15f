//! Publishing of the persisted configuration and uploaded assets.
//!
//! [`PublishPipeline`] snapshots what is on disk into a [`PublishBundle`] and
//! hands it to a [`Publisher`]; [`GitPublisher`] is the production publisher.

pub mod bundle;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod progress;
pub mod publisher;

pub use bundle::{BundleAsset, PublishBundle};
pub use error::{classify_git_error, PublishError};
pub use git::GitPublisher;
pub use pipeline::{PublishPipeline, DEFAULT_COMMIT_MESSAGE};
pub use progress::{PublishPhase, PublishProgress, PublishProgressEvent};
pub use publisher::{PublishReceipt, Publisher};
