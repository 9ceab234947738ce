//! API error type and the structured failure envelope.
//!
//! Every handler failure funnels through the engine taxonomy. The response
//! body is always `{"success": false, "message": ...}`; authentication
//! failures additionally carry `score` and `threshold` so the caller can
//! tell the user how to correct conditions.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use muster_core::{Error as EngineError, StateConflict};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub EngineError);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      EngineError::InputInvalid(_)
      | EngineError::EnrollmentMissing
      | EngineError::FormatMismatch { .. }
      | EngineError::Conflict(StateConflict::AlreadyCheckedIn)
      | EngineError::Conflict(StateConflict::AlreadyCheckedOut) => {
        StatusCode::BAD_REQUEST
      }
      EngineError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
      EngineError::Conflict(StateConflict::NoCheckInFound)
      | EngineError::IdentityNotFound(_) => StatusCode::NOT_FOUND,
      EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Storage causes must reach the log even when a deployment redacts the
    // response body.
    if let EngineError::Storage(cause) = &self.0 {
      tracing::error!(%cause, "storage failure");
    }

    let mut body = json!({ "success": false, "message": self.0.to_string() });
    if let EngineError::AuthenticationFailed { score, threshold } = &self.0 {
      body["score"] = json!(score);
      body["threshold"] = json!(threshold);
    }

    (status, Json(body)).into_response()
  }
}
