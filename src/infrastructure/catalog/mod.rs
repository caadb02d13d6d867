//! Catalog adapter: the two writes the onboarding core performs against the
//! durable content table. There are no reads; the core never reads before it
//! writes.

use async_trait::async_trait;
use thiserror::Error;

use crate::common::timeout::TimedOut;
use crate::modules::content::model::{ContentItem, ContentStatus, RenditionMap};

pub mod dynamodb;
#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use dynamodb::DynamoCatalog;
pub use postgres::PgCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog backend error: {0}")]
    Backend(String),
    #[error("content {0} not found in catalog")]
    NotFound(String),
    #[error("catalog call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<TimedOut> for CatalogError {
    fn from(t: TimedOut) -> Self {
        CatalogError::Timeout(t.0)
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Unconditional put of a new row. Clobbering an existing row is tolerated.
    async fn insert(&self, item: &ContentItem) -> Result<(), CatalogError>;

    /// Sets exactly `status` and `res_urls` on an existing row, replacing the
    /// previous rendition map. Fails with [`CatalogError::NotFound`] when no
    /// row exists for `content_id`.
    async fn update_status_and_renditions(
        &self,
        content_id: &str,
        status: ContentStatus,
        renditions: &RenditionMap,
    ) -> Result<(), CatalogError>;
}
