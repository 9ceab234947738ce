//! Attendance records and the day-bucket derivation.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Day bucket ──────────────────────────────────────────────────────────────

/// The local calendar day an instant falls in — the half-open interval
/// `[midnight, midnight + 1 day)` in the server's time zone.
///
/// This is the single derivation point for "today"; records are scoped to
/// the bucket of their check-in time.
pub fn day_bucket(at: DateTime<Utc>) -> NaiveDate {
  at.with_timezone(&Local).date_naive()
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle state of an attendance record. `CheckedOut` is terminal for
/// the record's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
  #[serde(rename = "checked-in")]
  CheckedIn,
  #[serde(rename = "checked-out")]
  CheckedOut,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The ledger's unit of truth.
///
/// `check_in_time` is set by every new check-in; first-generation rows that
/// carried only a free-form entries array may lack it. At most one record
/// exists per identity and day bucket, enforced by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
  pub record_id:      Uuid,
  #[serde(rename = "identity")]
  pub identity_id:    Uuid,
  pub check_in_time:  Option<DateTime<Utc>>,
  pub check_out_time: Option<DateTime<Utc>>,
  pub status:         AttendanceStatus,
  /// Free-form entries from the first persisted generation. Tolerated on
  /// read, defaulted to empty on write, never interpreted.
  pub legacy_entries: Vec<serde_json::Value>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl AttendanceRecord {
  /// The record's day bucket, derived from its check-in time rather than
  /// stored.
  pub fn day(&self) -> Option<NaiveDate> {
    self.check_in_time.map(day_bucket)
  }
}
