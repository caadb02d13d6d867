use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Plain-text success body, for callers that only read a human message.
pub struct ApiSuccess(pub String, pub StatusCode);

impl IntoResponse for ApiSuccess {
    fn into_response(self) -> Response {
        let (message, status) = (self.0, self.1);
        (status, message).into_response()
    }
}

pub struct ApiError(pub String, pub StatusCode);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(message.into(), StatusCode::BAD_REQUEST)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self(message.into(), StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, status) = (self.0, self.1);
        (status, message).into_response()
    }
}
