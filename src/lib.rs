//! blok-sync library - publish local files as assets to the blok template API

pub mod asset;
pub mod collect;
pub mod config;
pub mod error;
pub mod http_logger;
pub mod protocol;
pub mod service;
pub mod strategy;
pub mod upload;
pub mod utils;

// Re-export commonly used types
pub use asset::{AssetKey, ContentClassification, KeyMapper};
pub use config::{ConfigOptions, SessionConfig};
pub use error::{BlokError, Result};
pub use protocol::{Payload, Protocol};
pub use service::{HttpGateway, UploadGateway};
pub use upload::{AdmissionScheduler, Completion, FileContents, FileEntry, UploadReport};
