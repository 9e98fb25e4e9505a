use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::json;
use tracing::debug;

use crate::config::ApiConfig;

/// Admits requests carrying one of the configured bearer tokens.
pub(super) async fn bearer_auth(
    Extension(api): Extension<ApiConfig>,
    req: Request,
    next: Next,
) -> Response {
    fn need_auth() -> Response {
        let authn = [(header::WWW_AUTHENTICATE, "Bearer realm=\"resources\"")];
        let body = json!({
            "error": "Unauthorized",
            "message": "a valid bearer token is required",
        });
        (StatusCode::UNAUTHORIZED, authn, Json(body)).into_response()
    }
    let Some(authz) = req.headers().get(header::AUTHORIZATION) else {
        return need_auth();
    };

    let Ok(cred) = authz.to_str() else {
        return need_auth();
    };
    let Some(token) = cred.strip_prefix("Bearer ").map(str::trim) else {
        return need_auth();
    };

    if !api.accepts(token) {
        debug!(target: "http", uri = %req.uri(), "rejected bearer token");
        return need_auth();
    }

    next.run(req).await
}
