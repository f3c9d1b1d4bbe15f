//! Routing of uploaded assets into directories of the published repository.
//!
//! This is a filename heuristic, not content inspection: it only keeps the
//! published tree tidy and says nothing about what a file actually contains.

use std::fmt;

/// Destination directory for an asset in the published repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetBucket {
    Avatars,
    Places,
    Types,
    Img,
}

impl AssetBucket {
    /// Directory name inside the published repository.
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetBucket::Avatars => "avatars",
            AssetBucket::Places => "places",
            AssetBucket::Types => "types",
            AssetBucket::Img => "img",
        }
    }
}

impl fmt::Display for AssetBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Picks the bucket for a stored filename. First match wins, in the order
/// `avatar`, `place`, `type`; everything else goes to `img`.
pub fn classify_asset(stored_filename: &str) -> AssetBucket {
    if stored_filename.contains("avatar") {
        AssetBucket::Avatars
    } else if stored_filename.contains("place") {
        AssetBucket::Places
    } else if stored_filename.contains("type") {
        AssetBucket::Types
    } else {
        AssetBucket::Img
    }
}
