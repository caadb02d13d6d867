use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::events::TranscodeRequest;
use super::model::ContentItem;
use crate::common::timeout::with_timeout;
use crate::infrastructure::catalog::{CatalogError, CatalogStore};
use crate::infrastructure::queue::{QueueError, TranscodePublisher};

/// Both variants are retryable by the caller. A retry registers a new item.
#[derive(Debug, Error)]
pub enum OnboardError {
    #[error("catalog write failed: {0}")]
    Catalog(#[source] CatalogError),
    #[error("transcode request publish failed: {0}")]
    Queue(#[source] QueueError),
}

/// Registers new content and hands it to the transcoder.
#[derive(Clone)]
pub struct OnboardingService {
    catalog: Arc<dyn CatalogStore>,
    publisher: Arc<dyn TranscodePublisher>,
    io_timeout: Duration,
}

impl OnboardingService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        publisher: Arc<dyn TranscodePublisher>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            publisher,
            io_timeout,
        }
    }

    /// Writes the catalog row first and only then publishes the transcode
    /// request, so every completion event refers to an existing row. A failed
    /// publish leaves the row in `TRANSCODING`.
    pub async fn onboard(&self, url: &str, content_provider_id: &str) -> Result<String, OnboardError> {
        let content_id = Uuid::new_v4().to_string();
        let item = ContentItem::registered(content_id.clone(), content_provider_id, url);

        if let Err(e) = with_timeout(self.io_timeout, self.catalog.insert(&item)).await {
            error!(%content_id, error = %e, "Failed to store content in catalog");
            return Err(OnboardError::Catalog(e));
        }
        info!(%content_id, content_provider_id, "Stored content in catalog");

        let request = TranscodeRequest::from(&item);
        if let Err(e) = with_timeout(self.io_timeout, self.publisher.publish(&request)).await {
            error!(%content_id, error = %e, "Failed to publish transcode request; row left in TRANSCODING");
            return Err(OnboardError::Queue(e));
        }
        info!(%content_id, "Published transcode request");

        Ok(content_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::catalog::memory::InMemoryCatalog;
    use crate::infrastructure::queue::memory::RecordingPublisher;
    use crate::modules::content::model::{ContentStatus, RenditionMap};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;

    fn service(catalog: &Arc<InMemoryCatalog>, publisher: &Arc<RecordingPublisher>) -> OnboardingService {
        OnboardingService::new(catalog.clone(), publisher.clone(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn onboarding_writes_row_then_publishes_one_request() {
        let catalog = Arc::new(InMemoryCatalog::default());
        let publisher = Arc::new(RecordingPublisher::default());

        let id = service(&catalog, &publisher)
            .onboard("https://cdn.example/src.mp4", "prov-7")
            .await
            .unwrap();

        let row = catalog.get(&id).expect("row committed");
        assert_eq!(
            row,
            ContentItem {
                content_id: id.clone(),
                content_provider_id: "prov-7".into(),
                url: "https://cdn.example/src.mp4".into(),
                status: ContentStatus::Transcoding,
                res_urls: RenditionMap::new(),
            }
        );
        assert_eq!(
            publisher.sent(),
            vec![TranscodeRequest {
                content_id: id,
                url: "https://cdn.example/src.mp4".into(),
                content_provider_id: "prov-7".into(),
            }]
        );
    }

    #[tokio::test]
    async fn content_ids_are_fresh_uuids() {
        let catalog = Arc::new(InMemoryCatalog::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let svc = service(&catalog, &publisher);

        let a = svc.onboard("u", "p").await.unwrap();
        let b = svc.onboard("u", "p").await.unwrap();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn failed_insert_sends_nothing() {
        let catalog = Arc::new(InMemoryCatalog::default());
        catalog.fail_inserts.store(true, Ordering::SeqCst);
        let publisher = Arc::new(RecordingPublisher::default());

        let err = service(&catalog, &publisher).onboard("u", "p").await.unwrap_err();

        assert!(matches!(err, OnboardError::Catalog(_)));
        assert!(publisher.sent().is_empty());
        assert_eq!(catalog.len(), 0);
    }

    #[tokio::test]
    async fn failed_publish_leaves_row_transcoding() {
        let catalog = Arc::new(InMemoryCatalog::default());
        let publisher = Arc::new(RecordingPublisher::default());
        publisher.fail.store(true, Ordering::SeqCst);

        let err = service(&catalog, &publisher).onboard("u", "p").await.unwrap_err();

        assert!(matches!(err, OnboardError::Queue(_)));
        assert!(publisher.sent().is_empty());
        assert_eq!(catalog.len(), 1);
    }

    struct StalledCatalog;

    #[async_trait]
    impl CatalogStore for StalledCatalog {
        async fn insert(&self, _item: &ContentItem) -> Result<(), CatalogError> {
            std::future::pending().await
        }

        async fn update_status_and_renditions(
            &self,
            _content_id: &str,
            _status: ContentStatus,
            _renditions: &RenditionMap,
        ) -> Result<(), CatalogError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_catalog_times_out_without_publishing() {
        let publisher = Arc::new(RecordingPublisher::default());
        let svc = OnboardingService::new(Arc::new(StalledCatalog), publisher.clone(), Duration::from_secs(2));

        let err = svc.onboard("u", "p").await.unwrap_err();

        assert!(matches!(err, OnboardError::Catalog(CatalogError::Timeout(_))));
        assert!(publisher.sent().is_empty());
    }
}
