//! Derived work sessions — computed on demand, never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::record::{AttendanceRecord, day_bucket};

/// A completed work session: both timestamps present, duration in whole
/// minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  #[serde(rename = "identity")]
  pub identity_id:      Uuid,
  pub date:             NaiveDate,
  pub check_in_time:    DateTime<Utc>,
  pub check_out_time:   DateTime<Utc>,
  pub duration_minutes: i64,
}

/// Project completed sessions out of a set of records.
///
/// Lazy and restartable — a pure function of its input. Records missing
/// either timestamp (still active, abandoned, or first-generation) are
/// skipped here but remain visible in raw ledger listings.
pub fn sessions<'a, I>(records: I) -> impl Iterator<Item = Session> + 'a
where
  I: IntoIterator<Item = &'a AttendanceRecord>,
  I::IntoIter: 'a,
{
  records.into_iter().filter_map(|record| {
    let check_in_time = record.check_in_time?;
    let check_out_time = record.check_out_time?;
    Some(Session {
      identity_id: record.identity_id,
      date: day_bucket(check_in_time),
      check_in_time,
      check_out_time,
      duration_minutes: duration_minutes(check_in_time, check_out_time),
    })
  })
}

/// Whole minutes between two instants, rounded to nearest.
fn duration_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
  let millis = (to - from).num_milliseconds() as f64;
  (millis / 60_000.0).round() as i64
}
