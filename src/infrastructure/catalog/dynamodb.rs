use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{debug, info};

use super::{CatalogError, CatalogStore};
use crate::modules::content::model::{ContentItem, ContentStatus, RenditionMap};

pub const KEY_ATTR: &str = "contentId";

/// `status` is a DynamoDB reserved word, so it only ever appears through `#status`.
pub const UPDATE_EXPRESSION: &str = "SET #status = :status, res_urls = :res_urls";
pub const UPDATE_CONDITION: &str = "attribute_exists(contentId)";

#[derive(Clone)]
pub struct DynamoCatalog {
    client: Client,
    table: String,
}

impl DynamoCatalog {
    pub fn new(client: Client, table: &str) -> Self {
        info!("✅ DynamoDB catalog ready (table '{}')", table);
        Self {
            client,
            table: table.to_string(),
        }
    }
}

pub fn item_attributes(item: &ContentItem) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (KEY_ATTR.to_string(), AttributeValue::S(item.content_id.clone())),
        ("contentProviderId".to_string(), AttributeValue::S(item.content_provider_id.clone())),
        ("url".to_string(), AttributeValue::S(item.url.clone())),
        ("status".to_string(), AttributeValue::S(item.status.as_str().to_string())),
        ("res_urls".to_string(), rendition_attribute(&item.res_urls)),
    ])
}

pub fn rendition_attribute(renditions: &RenditionMap) -> AttributeValue {
    AttributeValue::M(
        renditions
            .iter()
            .map(|(label, url)| (label.clone(), AttributeValue::S(url.clone())))
            .collect(),
    )
}

#[async_trait]
impl CatalogStore for DynamoCatalog {
    async fn insert(&self, item: &ContentItem) -> Result<(), CatalogError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item_attributes(item)))
            .send()
            .await
            .map_err(|e| CatalogError::Backend(format!("PutItem failed: {}", e)))?;

        debug!(content_id = %item.content_id, "Stored content row in DynamoDB");
        Ok(())
    }

    async fn update_status_and_renditions(
        &self,
        content_id: &str,
        status: ContentStatus,
        renditions: &RenditionMap,
    ) -> Result<(), CatalogError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(KEY_ATTR, AttributeValue::S(content_id.to_string()))
            .update_expression(UPDATE_EXPRESSION)
            .condition_expression(UPDATE_CONDITION)
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":status", AttributeValue::S(status.as_str().to_string()))
            .expression_attribute_values(":res_urls", rendition_attribute(renditions))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(content_id, %status, "Updated content row in DynamoDB");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|svc| svc.is_conditional_check_failed_exception()) =>
            {
                Err(CatalogError::NotFound(content_id.to_string()))
            }
            Err(e) => Err(CatalogError::Backend(format!("UpdateItem failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_row_carries_every_catalog_attribute() {
        let item = ContentItem::registered("c-1".into(), "prov-7", "https://cdn.example/src.mp4");
        let attrs = item_attributes(&item);

        assert_eq!(attrs.len(), 5);
        assert_eq!(attrs["contentId"], AttributeValue::S("c-1".into()));
        assert_eq!(attrs["contentProviderId"], AttributeValue::S("prov-7".into()));
        assert_eq!(attrs["url"], AttributeValue::S("https://cdn.example/src.mp4".into()));
        assert_eq!(attrs["status"], AttributeValue::S("TRANSCODING".into()));
        assert_eq!(attrs["res_urls"], AttributeValue::M(HashMap::new()));
    }

    #[test]
    fn renditions_become_a_string_map() {
        let renditions = RenditionMap::from([
            ("720p".to_string(), "https://b/C/720.m3u8".to_string()),
            ("1080p".to_string(), "https://b/C/1080.m3u8".to_string()),
        ]);

        let AttributeValue::M(map) = rendition_attribute(&renditions) else {
            panic!("expected a map attribute");
        };
        assert_eq!(map.len(), 2);
        assert_eq!(map["720p"], AttributeValue::S("https://b/C/720.m3u8".into()));
        assert_eq!(map["1080p"], AttributeValue::S("https://b/C/1080.m3u8".into()));
    }

    #[test]
    fn update_routes_status_through_a_placeholder() {
        assert!(UPDATE_EXPRESSION.contains("#status = :status"));
        assert!(!UPDATE_EXPRESSION.contains(" status "));
        assert!(UPDATE_CONDITION.contains(KEY_ATTR));
    }
}
