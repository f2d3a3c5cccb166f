use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub mod catalog_routes;
pub mod info_routes;
pub mod playback_routes;
pub mod session_routes;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error reply with a JSON body.
pub fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
        .into_response()
}
