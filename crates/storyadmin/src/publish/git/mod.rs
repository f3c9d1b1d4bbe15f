//! Git command line adapter for publishing.

pub mod auth;
pub mod parse;
pub mod publisher;
pub mod repository;
pub mod types;

pub use publisher::GitPublisher;
pub use repository::GitRepository;
pub use types::*;
