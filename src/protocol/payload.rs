//! Request bodies for both protocol versions

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::asset::classify::decode_text;
use crate::asset::AssetKey;
use crate::config::SessionConfig;
use crate::upload::UploadJob;

/// Content-type tag sent with every asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetTag {
    Text,
    Asset,
    BinaryAsset,
}

impl AssetTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Asset => "asset",
            Self::BinaryAsset => "binary_asset",
        }
    }
}

/// Version 1 body: flat, credential travels in a header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyAssetBody {
    pub filepath: AssetKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(rename = "type")]
    pub kind: AssetTag,
}

/// Template fields of the version 2 envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateBody {
    pub path: AssetKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    pub tmpl_type: AssetTag,
    /// Mirrors `tmpl_type` for older consumers
    #[serde(rename = "type")]
    pub kind: AssetTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

/// Version 2 body: template plus credential
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateEnvelope {
    pub template: TemplateBody,
    pub token: String,
}

/// Provider-specific request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    V1(LegacyAssetBody),
    V2(TemplateEnvelope),
}

/// Where the content goes and how it is tagged
struct Placement {
    body: Option<String>,
    attachment: Option<String>,
    tag: AssetTag,
}

fn place_content(job: &UploadJob) -> Placement {
    if job.classification.is_binary {
        Placement {
            body: None,
            attachment: Some(STANDARD.encode(&job.contents)),
            tag: AssetTag::BinaryAsset,
        }
    } else {
        Placement {
            body: Some(decode_text(&job.contents)),
            attachment: None,
            tag: if job.classification.should_tag_as_asset {
                AssetTag::Asset
            } else {
                AssetTag::Text
            },
        }
    }
}

pub(crate) fn build_v1(job: &UploadJob) -> Payload {
    let placement = place_content(job);
    Payload::V1(LegacyAssetBody {
        filepath: job.key.clone(),
        body: placement.body,
        attachment: placement.attachment,
        kind: placement.tag,
    })
}

pub(crate) fn build_v2(job: &UploadJob, config: &SessionConfig) -> Payload {
    let placement = place_content(job);
    Payload::V2(TemplateEnvelope {
        template: TemplateBody {
            path: job.key.clone(),
            body: placement.body,
            attachment: placement.attachment,
            tmpl_type: placement.tag,
            kind: placement.tag,
            env: config.environment.clone(),
        },
        token: config.api_key.clone(),
    })
}
