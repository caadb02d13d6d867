use crate::common::response::{ApiError, ApiSuccess};
use crate::modules::content::dto::OnboardQuery;
use crate::modules::content::service::OnboardError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

/// Register new content and dispatch its transcode request
#[utoipa::path(
    post,
    path = "/content/onboard",
    params(OnboardQuery),
    responses(
        (status = 200, description = "Content onboarded", body = String),
        (status = 400, description = "Missing or empty query parameter"),
        (status = 500, description = "Catalog or queue failure, safe to retry", body = String)
    ),
    tag = "Content"
)]
pub async fn onboard_content(
    State(state): State<AppState>,
    Query(query): Query<OnboardQuery>,
) -> impl IntoResponse {
    if let Err(e) = query.validate() {
        return ApiError::bad_request(e.to_string()).into_response();
    }

    match state.onboarding.onboard(&query.url, &query.content_provider_id).await {
        Ok(content_id) => ApiSuccess(
            format!("Content onboarded successfully with ID: {}", content_id),
            StatusCode::OK,
        )
        .into_response(),
        Err(OnboardError::Catalog(_)) => {
            ApiError::internal("Failed to onboard content: catalog error").into_response()
        }
        Err(OnboardError::Queue(_)) => {
            ApiError::internal("Failed to onboard content: queue error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::infrastructure::catalog::memory::InMemoryCatalog;
    use crate::infrastructure::queue::memory::RecordingPublisher;
    use crate::modules::content::model::ContentStatus;
    use crate::modules::content::service::OnboardingService;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Harness {
        catalog: Arc<InMemoryCatalog>,
        publisher: Arc<RecordingPublisher>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                catalog: Arc::new(InMemoryCatalog::default()),
                publisher: Arc::new(RecordingPublisher::default()),
            }
        }

        async fn post(&self, uri: &str) -> (StatusCode, String) {
            let onboarding = OnboardingService::new(
                self.catalog.clone(),
                self.publisher.clone(),
                Duration::from_secs(1),
            );
            let app = crate::app::create_app(AppState::new(onboarding));

            let response = app
                .oneshot(Request::post(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }
    }

    #[tokio::test]
    async fn onboard_returns_generated_id() {
        let harness = Harness::new();

        let (status, body) = harness
            .post("/content/onboard?url=https%3A%2F%2Fcdn.example%2Fsrc.mp4&contentProviderId=prov-7")
            .await;

        assert_eq!(status, StatusCode::OK);
        let id = body
            .strip_prefix("Content onboarded successfully with ID: ")
            .expect("human-readable body");

        let row = harness.catalog.get(id).expect("row committed");
        assert_eq!(row.url, "https://cdn.example/src.mp4");
        assert_eq!(row.content_provider_id, "prov-7");
        assert_eq!(row.status, ContentStatus::Transcoding);
        assert!(row.res_urls.is_empty());

        let sent = harness.publisher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content_id, id);
    }

    #[tokio::test]
    async fn queue_failure_answers_500_and_keeps_row() {
        let harness = Harness::new();
        harness.publisher.fail.store(true, Ordering::SeqCst);

        let (status, body) = harness
            .post("/content/onboard?url=https%3A%2F%2Fcdn.example%2Fsrc.mp4&contentProviderId=prov-7")
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to onboard content: queue error");
        assert_eq!(harness.catalog.len(), 1);
        assert!(harness.publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn catalog_failure_answers_500() {
        let harness = Harness::new();
        harness.catalog.fail_inserts.store(true, Ordering::SeqCst);

        let (status, body) = harness.post("/content/onboard?url=u&contentProviderId=p").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to onboard content: catalog error");
        assert!(harness.publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn empty_parameter_is_a_bad_request() {
        let harness = Harness::new();

        let (status, _) = harness.post("/content/onboard?url=&contentProviderId=p").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(harness.catalog.len(), 0);
        assert!(harness.publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_parameter_is_a_bad_request() {
        let harness = Harness::new();

        let (status, _) = harness.post("/content/onboard?url=u").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(harness.catalog.len(), 0);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let harness = Harness::new();
        let onboarding = OnboardingService::new(
            harness.catalog.clone(),
            harness.publisher.clone(),
            Duration::from_secs(1),
        );
        let app = crate::app::create_app(AppState::new(onboarding));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
