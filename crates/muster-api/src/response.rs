//! Success envelope for verification endpoints.

use serde::Serialize;

/// `{"success": true, "message": ..., "data": ...}`
#[derive(Debug, Serialize)]
pub struct Success<T> {
  pub success: bool,
  pub message: String,
  pub data:    T,
}

impl<T> Success<T> {
  pub fn new(message: impl Into<String>, data: T) -> Self {
    Self { success: true, message: message.into(), data }
  }
}
