use std::sync::Arc;

use crate::asset::{classify, AssetKey, ContentClassification};

/// One admitted upload
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub key: AssetKey,
    pub contents: Arc<[u8]>,
    pub classification: ContentClassification,
}

impl UploadJob {
    /// Classify `contents` and bundle them with their key
    pub fn new(key: AssetKey, contents: Arc<[u8]>) -> Self {
        let classification = classify(&contents, &key);
        Self {
            key,
            contents,
            classification,
        }
    }
}
