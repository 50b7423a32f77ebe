//! Asset identity and content classification

pub mod classify;
pub mod key;

pub use classify::{classify, is_binary_content, ContentClassification};
pub use key::{AssetKey, KeyMapper};
