//! Content classification - binary vs text and asset tagging

use encoding_rs::UTF_8;

use super::key::AssetKey;

/// Number of leading bytes inspected for control characters
const SAMPLE_SIZE: usize = 512;

/// Extensions uploaded with the `asset` tag when their content is text
const ASSET_EXTENSIONS: &[&str] = &["js", "css", "svg", "json"];

/// Result of classifying one file's contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentClassification {
    pub is_binary: bool,
    pub extension: String,
    pub should_tag_as_asset: bool,
}

/// Classify raw file bytes for the given key
pub fn classify(raw: &[u8], key: &AssetKey) -> ContentClassification {
    let is_binary = is_binary_content(raw);
    let extension = key.extension().to_string();
    let should_tag_as_asset = !is_binary && is_asset_extension(&extension);

    ContentClassification {
        is_binary,
        extension,
        should_tag_as_asset,
    }
}

/// Check whether an extension belongs to the script/stylesheet/vector/data set
pub fn is_asset_extension(extension: &str) -> bool {
    ASSET_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Heuristic binary detection: any NUL byte or malformed UTF-8 means binary,
/// otherwise more than 10% suspicious control bytes in the leading sample.
pub fn is_binary_content(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }

    if bytes.contains(&0) || !is_valid_utf8(bytes) {
        return true;
    }

    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    let suspicious = sample
        .iter()
        .filter(|b| matches!(**b, 0x01..=0x06 | 0x0F..=0x1F))
        .count();

    suspicious * 10 > sample.len()
}

fn is_valid_utf8(bytes: &[u8]) -> bool {
    UTF_8
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some()
}

/// Text content as UTF-8, byte order mark included. Malformed sequences are
/// replaced, but classified content never has any.
pub fn decode_text(bytes: &[u8]) -> String {
    let (content, _) = UTF_8.decode_without_bom_handling(bytes);
    content.into_owned()
}
