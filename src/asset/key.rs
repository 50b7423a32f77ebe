//! Local path to remote asset key mapping

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::error::Result;
use crate::utils::path_normalizer::{lexical_absolute, normalize_relative_path, relative_path};

/// Characters left intact when encoding a key: unreserved marks plus URI
/// delimiters, so `/` separators survive.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

/// Canonical, URI-safe, forward-slash path identifying a remote asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Wrap an already encoded key
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension after the final `.` of the last segment, empty when there is none
    pub fn extension(&self) -> &str {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        match name.rfind('.') {
            Some(idx) => &name[idx + 1..],
            None => "",
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives asset keys relative to a base directory resolved once and cached
#[derive(Debug, Default)]
pub struct KeyMapper {
    base: OnceLock<PathBuf>,
}

impl KeyMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapper whose base directory is fixed up front instead of taken from the first file
    pub fn with_base_path(base: &Path) -> Result<Self> {
        let mut mapper = Self::new();
        mapper.set_base_path(base)?;
        Ok(mapper)
    }

    /// Replace the cached base directory
    pub fn set_base_path(&mut self, base: &Path) -> Result<()> {
        self.base = OnceLock::from(lexical_absolute(base)?);
        Ok(())
    }

    /// Forget the cached base so the next key resolves it again
    pub fn reset(&mut self) {
        self.base = OnceLock::new();
    }

    /// Cached base directory, if resolved yet
    pub fn base_path(&self) -> Option<&Path> {
        self.base.get().map(PathBuf::as_path)
    }

    /// Resolve `base` (or the current directory when empty) the first time a
    /// base is needed. Later calls reuse the cached value.
    pub fn resolve_base(&self, base: &Path) -> Result<&Path> {
        if let Some(cached) = self.base.get() {
            return Ok(cached.as_path());
        }

        let resolved = if base.as_os_str().is_empty() {
            std::env::current_dir()?
        } else {
            base.to_path_buf()
        };
        let resolved = lexical_absolute(&resolved)?;

        Ok(self.base.get_or_init(|| resolved).as_path())
    }

    /// Convert a local file path into its remote asset key
    pub fn make_asset_key(&self, path: &Path, base: &Path) -> Result<AssetKey> {
        let base = self.resolve_base(base)?;
        let path = lexical_absolute(path)?;
        let relative = relative_path(&path, base);
        let normalized = normalize_relative_path(&relative.to_string_lossy());

        Ok(AssetKey(
            utf8_percent_encode(&normalized, KEY_ENCODE_SET).to_string(),
        ))
    }
}
