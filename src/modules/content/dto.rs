use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OnboardQuery {
    /// Source video URL, opaque to this service.
    #[validate(length(min = 1, message = "url must not be empty"))]
    pub url: String,
    /// Upstream content provider identifier.
    #[validate(length(min = 1, message = "contentProviderId must not be empty"))]
    pub content_provider_id: String,
}
