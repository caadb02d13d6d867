use axum::Router;
use axum::routing::post;
use crate::state::AppState;

pub mod completion;
pub mod dto;
pub mod events;
pub mod handler;
pub mod model;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().route("/onboard", post(handler::onboard_content))
}
