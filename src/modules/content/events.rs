use serde::{Deserialize, Serialize};

use super::model::ContentItem;

/// Outbound hand-off to the transcoder. The transcoder echoes it back verbatim
/// as `detail.userMetadata` on the completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeRequest {
    pub content_id: String,
    pub url: String,
    pub content_provider_id: String,
}

impl From<&ContentItem> for TranscodeRequest {
    fn from(item: &ContentItem) -> Self {
        Self {
            content_id: item.content_id.clone(),
            url: item.url.clone(),
            content_provider_id: item.content_provider_id.clone(),
        }
    }
}
