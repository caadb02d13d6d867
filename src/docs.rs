use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::content::handler::onboard_content,
    ),
    components(
        schemas(
            crate::modules::content::model::ContentItem,
            crate::modules::content::model::ContentStatus,
        )
    ),
    tags(
        (name = "Content", description = "Content onboarding and transcode dispatch")
    )
)]
pub struct ApiDoc;
