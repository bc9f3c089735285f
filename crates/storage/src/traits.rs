use serde::{Deserialize, Serialize};
use std::fmt;

use sitesurvey_core::{ImageId, ScreenKey, ScreenSnapshot, SubmitRequest};

use crate::error::StorageError;

/// blake3 digest addressing a stored media blob.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}...)", self.0[0], self.0[1])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub image_id: ImageId,
    pub slot: String,
    pub filename: String,
    pub content_hash: ContentHash,
    pub size: u64,
}

/// The persistence endpoint a screen saves to.
///
/// `save` applies a submission and answers with the authoritative state the
/// screen must re-seed from. Media slots absent from the request keep their
/// stored image; an empty marker deletes it.
pub trait SurveyStore {
    fn load(&self, key: &ScreenKey) -> Result<ScreenSnapshot, StorageError>;

    fn save(
        &mut self,
        key: &ScreenKey,
        request: &SubmitRequest,
    ) -> Result<ScreenSnapshot, StorageError>;
}
