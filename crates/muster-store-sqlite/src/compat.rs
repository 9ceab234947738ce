//! Encoding, decoding, and the legacy-shape shim at the storage boundary.
//!
//! Three persisted generations of attendance rows exist in the wild; this
//! module is the only place that knows about them. Everything above it sees
//! the canonical [`AttendanceRecord`] shape: the identity resolved from
//! either historical column, `work_entries` carried through untouched and
//! defaulted to `[]` on write, timestamps as RFC 3339 UTC strings.

use chrono::{DateTime, NaiveDate, Utc};
use muster_core::{
  descriptor::{Descriptor, EnrolledDescriptor, Pose},
  identity::Identity,
  record::{AttendanceRecord, AttendanceStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_day(day: NaiveDate) -> String { day.to_string() }

// ─── AttendanceStatus ────────────────────────────────────────────────────────

pub fn encode_status(status: AttendanceStatus) -> &'static str {
  match status {
    AttendanceStatus::CheckedIn => "checked-in",
    AttendanceStatus::CheckedOut => "checked-out",
  }
}

pub fn decode_status(s: &str) -> Result<AttendanceStatus> {
  match s {
    "checked-in" => Ok(AttendanceStatus::CheckedIn),
    "checked-out" => Ok(AttendanceStatus::CheckedOut),
    other => Err(Error::DateParse(format!("unknown attendance status: {other:?}"))),
  }
}

// ─── Pose ────────────────────────────────────────────────────────────────────

pub fn encode_pose(pose: Pose) -> &'static str {
  match pose {
    Pose::Front => "front",
    Pose::Left => "left",
    Pose::Right => "right",
  }
}

pub fn decode_pose(s: &str) -> Result<Pose> {
  match s {
    "front" => Ok(Pose::Front),
    "left" => Ok(Pose::Left),
    "right" => Ok(Pose::Right),
    other => Err(Error::DateParse(format!("unknown pose: {other:?}"))),
  }
}

// ─── Descriptor vectors ──────────────────────────────────────────────────────

pub fn encode_vector(vector: &Descriptor) -> Result<String> {
  Ok(serde_json::to_string(vector.as_slice())?)
}

pub fn decode_vector(s: &str) -> Result<Descriptor> {
  let components: Vec<f64> = serde_json::from_str(s)?;
  Descriptor::new(components).map_err(|e| Error::InvalidVector(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:  String,
  pub display_name: Option<String>,
  pub created_at:   String,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:  decode_uuid(&self.identity_id)?,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `descriptors` row.
pub struct RawDescriptor {
  pub pose:        String,
  pub vector_json: String,
}

impl RawDescriptor {
  pub fn into_enrolled(self) -> Result<EnrolledDescriptor> {
    Ok(EnrolledDescriptor {
      pose:   decode_pose(&self.pose)?,
      vector: decode_vector(&self.vector_json)?,
    })
  }
}

/// Raw strings read directly from an `attendance` row, before the shim
/// resolves the generation differences.
pub struct RawAttendanceRow {
  pub record_id:      String,
  pub identity_id:    Option<String>,
  pub employee_id:    Option<String>,
  pub check_in_time:  Option<String>,
  pub check_out_time: Option<String>,
  pub status:         String,
  pub work_entries:   String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAttendanceRow {
  pub fn into_record(self) -> Result<AttendanceRecord> {
    // The identity may live under either historical column name; the
    // canonical column wins when both are set.
    let identity_str = self
      .identity_id
      .or(self.employee_id)
      .ok_or_else(|| Error::MissingIdentity(self.record_id.clone()))?;

    // Malformed first-generation entry arrays are surfaced as empty rather
    // than failing the whole read.
    let legacy_entries: Vec<serde_json::Value> =
      serde_json::from_str(&self.work_entries).unwrap_or_default();

    Ok(AttendanceRecord {
      record_id:      decode_uuid(&self.record_id)?,
      identity_id:    decode_uuid(&identity_str)?,
      check_in_time:  self.check_in_time.as_deref().map(decode_dt).transpose()?,
      check_out_time: self.check_out_time.as_deref().map(decode_dt).transpose()?,
      status:         decode_status(&self.status)?,
      legacy_entries,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}
