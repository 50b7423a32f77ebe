//! Configuration module - session settings and pacing defaults

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{BlokError, Result};
use crate::protocol::Protocol;

/// Default origin of the versioned management API
pub const DEFAULT_MANAGEMENT_API_URL: &str = "https://api.storyblok.com";

/// Number of uploads dispatched immediately before pacing starts
pub const DEFAULT_BURST_BUCKET_SIZE: usize = 40;

/// Uploads per second once the burst bucket is spent
pub const DEFAULT_THROUGHPUT_PER_SECOND: u64 = 2;

/// Default HTTP client timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Optional configuration parameters for SessionConfig::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub host: Option<String>,
    pub api_version: Option<u32>,
    pub environment: Option<String>,
    pub base_path: Option<PathBuf>,
    pub management_api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub burst_bucket_size: Option<usize>,
    pub throughput_per_second: Option<u64>,
}

/// Immutable settings for one upload run
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_key: String,
    pub theme_id: String,
    pub protocol: Protocol,
    /// Legacy API origin, only set for protocol version 1
    pub host: Option<String>,
    pub environment: Option<String>,
    pub base_path: Option<PathBuf>,
    pub management_api_url: String,
    pub request_timeout_secs: u64,
    pub burst_bucket_size: usize,
    pub throughput_per_second: u64,
}

impl SessionConfig {
    /// Create a validated session config. Missing required fields fail here,
    /// before the scheduler admits anything.
    pub fn new(api_key: String, theme_id: String, options: ConfigOptions) -> Result<Arc<Self>> {
        if api_key.trim().is_empty() {
            return Err(BlokError::Configuration(
                "API key for blok does not exist".to_string(),
            ));
        }

        if theme_id.trim().is_empty() {
            return Err(BlokError::Configuration(
                "theme id for blok does not exist".to_string(),
            ));
        }

        let api_version = options.api_version.unwrap_or(1);
        let protocol = Protocol::from_version(api_version).ok_or_else(|| {
            BlokError::Configuration(format!("unsupported api version: {}", api_version))
        })?;

        let host = match options.host.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => Some(normalize_origin(h)),
            _ => None,
        };

        if protocol == Protocol::V1 && host.is_none() {
            return Err(BlokError::Configuration(
                "host for blok does not exist".to_string(),
            ));
        }

        let throughput_per_second = options
            .throughput_per_second
            .unwrap_or(DEFAULT_THROUGHPUT_PER_SECOND);
        if throughput_per_second == 0 {
            return Err(BlokError::Configuration(
                "throughput must be at least one upload per second".to_string(),
            ));
        }

        let environment = options
            .environment
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        Ok(Arc::new(Self {
            api_key,
            theme_id,
            protocol,
            host,
            environment,
            base_path: options.base_path,
            management_api_url: normalize_origin(
                options
                    .management_api_url
                    .as_deref()
                    .unwrap_or(DEFAULT_MANAGEMENT_API_URL),
            ),
            request_timeout_secs: options
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            burst_bucket_size: options
                .burst_bucket_size
                .unwrap_or(DEFAULT_BURST_BUCKET_SIZE),
            throughput_per_second,
        }))
    }
}

/// Add `https://` when no scheme is given and strip trailing slashes.
/// An explicit `http://` is kept so local mirrors keep working.
fn normalize_origin(origin: &str) -> String {
    let origin = origin.trim();
    let origin = if origin.starts_with("http://") || origin.starts_with("https://") {
        origin.to_string()
    } else {
        format!("https://{}", origin)
    };
    origin.trim_end_matches('/').to_string()
}
