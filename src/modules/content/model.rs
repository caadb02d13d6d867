use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rendition label (`"1080p"`) to delivery URL.
pub type RenditionMap = BTreeMap<String, String>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum ContentStatus {
    #[serde(rename = "TRANSCODING")]
    Transcoding,
    #[serde(rename = "TRANSCODINGCOMPLETE")]
    TranscodingComplete,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Transcoding => "TRANSCODING",
            ContentStatus::TranscodingComplete => "TRANSCODINGCOMPLETE",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog row, keyed by `content_id`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub content_id: String,
    pub content_provider_id: String,
    pub url: String,
    pub status: ContentStatus,
    #[serde(rename = "res_urls")]
    #[schema(value_type = Object)]
    pub res_urls: RenditionMap,
}

impl ContentItem {
    /// A freshly registered item: transcoding, no renditions yet.
    pub fn registered(content_id: String, content_provider_id: &str, url: &str) -> Self {
        Self {
            content_id,
            content_provider_id: content_provider_id.to_string(),
            url: url.to_string(),
            status: ContentStatus::Transcoding,
            res_urls: RenditionMap::new(),
        }
    }
}
