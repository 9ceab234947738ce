//! Storage trait seams and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `muster-store-sqlite`). Higher layers depend on these abstractions, not
//! on any concrete backend. Backend failures are wrapped into
//! [`Error::Storage`](crate::Error::Storage) at this seam so callers see one
//! error taxonomy.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  Result,
  descriptor::EnrolledDescriptor,
  identity::Identity,
  record::{AttendanceRecord, AttendanceStatus},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`AttendanceLedger::query_records`] — the administrative
/// listing surface.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
  pub identity: Option<Uuid>,
  /// Inclusive lower bound on the record's day bucket.
  pub from:     Option<NaiveDate>,
  /// Inclusive upper bound on the record's day bucket.
  pub to:       Option<NaiveDate>,
  pub status:   Option<AttendanceStatus>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

// ─── Descriptor store ────────────────────────────────────────────────────────

/// Identity registry plus each identity's enrolled descriptors.
///
/// All methods return `Send` futures so the traits can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DescriptorStore: Send + Sync {
  /// Create and persist a new identity.
  fn add_identity(
    &self,
    display_name: Option<String>,
  ) -> impl Future<Output = Result<Identity>> + Send + '_;

  /// Retrieve an identity by id. Returns `None` if not found.
  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>>> + Send + '_;

  /// List all identities.
  fn list_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>>> + Send + '_;

  /// All enrolled descriptors for an identity — zero to three, at most one
  /// per pose.
  fn enrolled_descriptors(
    &self,
    identity: Uuid,
  ) -> impl Future<Output = Result<Vec<EnrolledDescriptor>>> + Send + '_;

  /// Replace an identity's enrolled set wholesale, atomically.
  ///
  /// Fails with [`Error::IdentityNotFound`](crate::Error::IdentityNotFound)
  /// for an unknown identity.
  fn replace_descriptors(
    &self,
    identity: Uuid,
    descriptors: Vec<EnrolledDescriptor>,
  ) -> impl Future<Output = Result<Vec<EnrolledDescriptor>>> + Send + '_;
}

// ─── Attendance ledger ───────────────────────────────────────────────────────

/// The per-identity, per-day check-in/check-out state machine.
///
/// Implementations must make `check_in` atomic with respect to concurrent
/// calls for the same identity: two racing check-ins may never both create
/// a `checked-in` record for the same day. The reference backend enforces
/// this with a storage-level uniqueness constraint on (identity, day
/// bucket) and reports the losing writer's constraint violation as
/// [`StateConflict::AlreadyCheckedIn`](crate::StateConflict::AlreadyCheckedIn).
/// The same applies to `check_out`'s read-then-update, closed with an
/// atomic conditional write.
pub trait AttendanceLedger: Send + Sync {
  /// Open today's record for `identity`.
  ///
  /// Callers must hold a matcher acceptance for the identity before
  /// invoking this.
  fn check_in(
    &self,
    identity: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<AttendanceRecord>> + Send + '_;

  /// Close the identity's open record.
  ///
  /// Keyed by the check-in day, so a session spanning midnight still closes
  /// the record it opened.
  fn check_out(
    &self,
    identity: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<AttendanceRecord>> + Send + '_;

  /// Raw records for one identity, newest check-in first. Includes open and
  /// legacy rows.
  fn records_for_identity(
    &self,
    identity: Uuid,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>>> + Send + '_;

  /// Administrative listing filtered by identity, day range, and status.
  fn query_records<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>>> + Send + 'a;
}
