//! Error type for `muster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored descriptor vector failed validation on read.
  #[error("invalid stored descriptor vector: {0}")]
  InvalidVector(String),

  /// A persisted attendance row carries no identity under either
  /// historical column.
  #[error("attendance row {0} has no identity")]
  MissingIdentity(String),
}

impl From<Error> for muster_core::Error {
  fn from(e: Error) -> Self {
    muster_core::Error::storage(e)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
