//! Files entering the scheduler

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Contents of an incoming file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// Fully materialized in memory
    Buffer(Arc<[u8]>),
    /// Still being streamed; not supported
    Stream,
    /// No contents, e.g. a directory
    Null,
}

/// A file handed over by the collection stage and forwarded downstream unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Directory the key is made relative to; empty means the working directory
    pub base: PathBuf,
    pub contents: FileContents,
}

impl FileEntry {
    pub fn buffer(path: impl AsRef<Path>, base: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            base: base.as_ref().to_path_buf(),
            contents: FileContents::Buffer(Arc::from(bytes.into())),
        }
    }

    pub fn stream(path: impl AsRef<Path>, base: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            base: base.as_ref().to_path_buf(),
            contents: FileContents::Stream,
        }
    }

    pub fn null(path: impl AsRef<Path>, base: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            base: base.as_ref().to_path_buf(),
            contents: FileContents::Null,
        }
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.contents, FileContents::Buffer(_))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.contents, FileContents::Stream)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.contents, FileContents::Null)
    }
}
