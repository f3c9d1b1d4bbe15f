//! Broadcasting of events to live subscribers (SSE streams, UI clients).

pub mod publish_progress;

pub use publish_progress::PublishProgressBroadcaster;
