//! Error types for `muster-core` — the engine-wide failure taxonomy.
//!
//! Every failure is reported synchronously to the caller on first
//! occurrence; nothing in the engine retries.

use thiserror::Error;
use uuid::Uuid;

/// A check-in/check-out lifecycle violation for one identity and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateConflict {
  #[error("Already checked-in for today")]
  AlreadyCheckedIn,

  #[error("Already checked-out for today")]
  AlreadyCheckedOut,

  #[error("No check-in record found for today")]
  NoCheckInFound,
}

#[derive(Debug, Error)]
pub enum Error {
  /// The live descriptor was absent, not an array, or not a non-empty
  /// vector of finite numbers. Raised before any candidate is examined.
  #[error("invalid descriptor: {0}")]
  InputInvalid(String),

  /// The identity exists but has no enrolled descriptors.
  #[error("no descriptors enrolled for this identity")]
  EnrollmentMissing,

  /// No enrolled descriptor has the live descriptor's length.
  #[error("no enrolled descriptor of length {live_len}")]
  FormatMismatch { live_len: usize },

  /// The nearest candidate was still too far away. Carries the numbers so
  /// callers can tell the user to improve lighting or camera angle.
  #[error(
    "face does not match closely enough (score {score:.4}, threshold \
     {threshold}); improve lighting or camera angle"
  )]
  AuthenticationFailed { score: f64, threshold: f64 },

  #[error(transparent)]
  Conflict(#[from] StateConflict),

  #[error("identity not found: {0}")]
  IdentityNotFound(Uuid),

  /// A storage backend failure. The cause is preserved for diagnostics.
  #[error("storage failure: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure at the storage seam.
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
