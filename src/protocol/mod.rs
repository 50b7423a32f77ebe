//! Remote API protocol variants
//!
//! Version 1 talks to a per-theme endpoint and authenticates with an
//! `x-api-key` header. Version 2 and later use the per-space
//! "create or update template" endpoint with the credential in the body.

mod payload;

pub use payload::{AssetTag, LegacyAssetBody, Payload, TemplateBody, TemplateEnvelope};

use crate::config::SessionConfig;
use crate::upload::UploadJob;

/// Header carrying the credential for version 1
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    V1,
    V2,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

impl Protocol {
    /// Map a configured version number; 0 is not a version
    pub fn from_version(version: u32) -> Option<Self> {
        match version {
            0 => None,
            1 => Some(Self::V1),
            _ => Some(Self::V2),
        }
    }

    /// URL the PUT request is sent to
    pub fn endpoint(&self, config: &SessionConfig) -> String {
        match self {
            Self::V1 => format!(
                "{}/api-v1/theme/{}",
                config.host.as_deref().unwrap_or_default(),
                config.theme_id
            ),
            Self::V2 => format!(
                "{}/v1/spaces/{}/templates/create_or_update",
                config.management_api_url, config.theme_id
            ),
        }
    }

    /// Credential header, if this version sends one
    pub fn credential_header<'a>(
        &self,
        config: &'a SessionConfig,
    ) -> Option<(&'static str, &'a str)> {
        match self {
            Self::V1 => Some((API_KEY_HEADER, config.api_key.as_str())),
            Self::V2 => None,
        }
    }

    /// Build the request body. Pure: the result depends only on the inputs.
    pub fn build_payload(&self, job: &UploadJob, config: &SessionConfig) -> Payload {
        match self {
            Self::V1 => payload::build_v1(job),
            Self::V2 => payload::build_v2(job, config),
        }
    }
}
