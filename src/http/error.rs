use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::error::MapperError;

impl IntoResponse for MapperError {
    fn into_response(self) -> Response {
        let status = match &self {
            MapperError::GraphNotFound(_) | MapperError::ResourceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            MapperError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        let message = match &self {
            MapperError::Storage(err) => {
                error!(target: "http", "storage failure: {err:#}");
                "internal storage error".to_string()
            }
            other => {
                warn!(target: "http", kind = other.kind(), "{other}");
                other.to_string()
            }
        };
        let body = json!({ "error": self.kind(), "message": message });
        (status, Json(body)).into_response()
    }
}
