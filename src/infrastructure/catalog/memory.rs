use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{CatalogError, CatalogStore};
use crate::modules::content::model::{ContentItem, ContentStatus, RenditionMap};

/// Test double keeping rows in a map, with switches to force backend failures.
#[derive(Default)]
pub struct InMemoryCatalog {
    rows: Mutex<HashMap<String, ContentItem>>,
    pub fail_inserts: AtomicBool,
    pub fail_updates: AtomicBool,
}

impl InMemoryCatalog {
    pub fn get(&self, content_id: &str) -> Option<ContentItem> {
        self.rows.lock().unwrap().get(content_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn seed(&self, item: ContentItem) {
        self.rows.lock().unwrap().insert(item.content_id.clone(), item);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn insert(&self, item: &ContentItem) -> Result<(), CatalogError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(CatalogError::Backend("insert refused".into()));
        }
        self.seed(item.clone());
        Ok(())
    }

    async fn update_status_and_renditions(
        &self,
        content_id: &str,
        status: ContentStatus,
        renditions: &RenditionMap,
    ) -> Result<(), CatalogError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(CatalogError::Backend("update refused".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(content_id)
            .ok_or_else(|| CatalogError::NotFound(content_id.to_string()))?;
        row.status = status;
        row.res_urls = renditions.clone();
        Ok(())
    }
}
