//! Optional shared-secret gate for the webhook route.
//!
//! With no secret configured every call is admitted. With a secret, the
//! `Authorization` header must be exactly `Bearer <secret>`.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use crate::SharedState;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Whether a request carrying `header` may pass when `secret` is configured.
pub fn is_authorized(secret: Option<&str>, header: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };

    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}

/// Middleware rejecting webhook calls that fail [`is_authorized`].
pub async fn require_webhook_secret(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if is_authorized(state.webhook_secret.as_deref(), header) {
        return next.run(req).await;
    }

    warn!(
        has_header = header.is_some(),
        "Unauthorized webhook call — missing or invalid bearer token"
    );
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: "Unauthorized",
        }),
    )
        .into_response()
}
