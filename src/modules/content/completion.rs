//! Reads transcoder completion events.
//!
//! The event schema belongs to the transcoder, so only two paths are modelled:
//! `detail.userMetadata` (the echoed [`TranscodeRequest`]) and
//! `detail.outputGroupDetails[*].outputDetails[*]` (one rendition per output
//! file). Everything else in the envelope is ignored.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::events::TranscodeRequest;
use super::model::RenditionMap;

const OBJECT_STORE_SCHEME: &str = "s3://";
const DELIVERY_SCHEME: &str = "https://";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("completion message is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("completion message has no detail.userMetadata object")]
    MissingUserMetadata,
    #[error("detail.userMetadata has no contentId")]
    MissingContentId,
    #[error("completion message for {0} carries no renditions")]
    NoRenditions(String),
}

/// A completion event reduced to what the catalog needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request: TranscodeRequest,
    pub renditions: RenditionMap,
}

impl Completion {
    pub fn content_id(&self) -> &str {
        &self.request.content_id
    }
}

pub fn parse_completion(body: &[u8]) -> Result<Completion, EnvelopeError> {
    let root: Value = serde_json::from_slice(body)?;

    let request = transcode_request(&root)?;
    let renditions = extract_renditions(&root);
    if renditions.is_empty() {
        return Err(EnvelopeError::NoRenditions(request.content_id));
    }

    Ok(Completion { request, renditions })
}

fn transcode_request(root: &Value) -> Result<TranscodeRequest, EnvelopeError> {
    let metadata = root
        .pointer("/detail/userMetadata")
        .and_then(Value::as_object)
        .ok_or(EnvelopeError::MissingUserMetadata)?;

    let content_id = metadata
        .get("contentId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(EnvelopeError::MissingContentId)?;

    let text = |key: &str| {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(TranscodeRequest {
        content_id: content_id.to_string(),
        url: text("url"),
        content_provider_id: text("contentProviderId"),
    })
}

/// Walks every output file of every output detail in traversal order. A later
/// file with the same height label replaces an earlier one.
fn extract_renditions(root: &Value) -> RenditionMap {
    let mut renditions = RenditionMap::new();

    let groups = root
        .pointer("/detail/outputGroupDetails")
        .and_then(Value::as_array)
        .into_iter()
        .flatten();

    for group in groups {
        let details = group
            .get("outputDetails")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();

        for detail in details {
            let Some(height) = video_height(detail) else {
                warn!("Output detail without an integer videoDetails.height, skipping");
                continue;
            };
            let label = rendition_label(height);

            let paths = detail
                .get("outputFilePaths")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str);

            for path in paths {
                match delivery_url(path) {
                    Some(url) => {
                        renditions.insert(label.clone(), url);
                    }
                    None => warn!(path, "Output file path has no object-store scheme, skipping"),
                }
            }
        }
    }

    renditions
}

fn video_height(detail: &Value) -> Option<u64> {
    match detail.pointer("/videoDetails/height")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn rendition_label(height: u64) -> String {
    format!("{height}p")
}

/// Literal `s3://` to `https://` prefix swap; no URL parsing or re-encoding.
fn delivery_url(path: &str) -> Option<String> {
    if let Some(rest) = path.strip_prefix(OBJECT_STORE_SCHEME) {
        Some(format!("{DELIVERY_SCHEME}{rest}"))
    } else if path.starts_with(DELIVERY_SCHEME) {
        Some(path.to_string())
    } else {
        None
    }
}
