//! Webhook error taxonomy — every failure converts to the JSON response
//! envelope at the adapter boundary; nothing escapes as a raw fault.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// A single field-level validation diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDiagnostic {
    pub field: String,
    pub message: String,
}

impl FieldDiagnostic {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Missing/unknown webhook token, or signature/secret mismatch.
    #[error("invalid webhook token")]
    Unauthorized,

    /// Request body is not parseable JSON.
    #[error("malformed JSON body")]
    BadRequest,

    /// Payload parsed but does not match the provider schema.
    #[error("invalid webhook payload")]
    Validation(Vec<FieldDiagnostic>),

    /// Unexpected store or pool failure. Logged server-side, opaque to the
    /// caller.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            WebhookError::Unauthorized => {
                crate::metrics::webhook_rejected("unauthorized");
                (
                    StatusCode::UNAUTHORIZED,
                    serde_json::json!({ "success": false, "error": "Invalid webhook token" }),
                )
            }
            WebhookError::BadRequest => {
                crate::metrics::webhook_rejected("bad_request");
                (
                    StatusCode::BAD_REQUEST,
                    serde_json::json!({ "success": false, "error": "Malformed JSON body" }),
                )
            }
            WebhookError::Validation(details) => {
                crate::metrics::webhook_rejected("validation");
                (
                    StatusCode::BAD_REQUEST,
                    serde_json::json!({
                        "success": false,
                        "error": "Invalid webhook payload",
                        "details": details,
                    }),
                )
            }
            WebhookError::Internal(e) => {
                crate::metrics::webhook_rejected("internal");
                tracing::error!("Webhook processing failed: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "success": false, "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
