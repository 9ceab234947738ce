//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Local, TimeZone, Utc};
use muster_core::{
  Error, StateConflict,
  descriptor::{Descriptor, EnrolledDescriptor, Pose},
  record::AttendanceStatus,
  session,
  store::{AttendanceLedger, DescriptorStore, RecordQuery},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn enrolled(pose: Pose, components: &[f64]) -> EnrolledDescriptor {
  EnrolledDescriptor {
    pose,
    vector: Descriptor::new(components.to_vec()).unwrap(),
  }
}

fn local_utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
  Local
    .with_ymd_and_hms(y, mo, d, h, mi, s)
    .unwrap()
    .with_timezone(&Utc)
}

// ─── Identities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_identity() {
  let s = store().await;

  let identity = s.add_identity(Some("Alice".into())).await.unwrap();
  let fetched = s.get_identity(identity.identity_id).await.unwrap().unwrap();
  assert_eq!(fetched.identity_id, identity.identity_id);
  assert_eq!(fetched.display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn get_identity_missing_returns_none() {
  let s = store().await;
  let result = s.get_identity(Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_identities_all() {
  let s = store().await;
  s.add_identity(None).await.unwrap();
  s.add_identity(Some("Bob".into())).await.unwrap();

  let all = s.list_identities().await.unwrap();
  assert_eq!(all.len(), 2);
}

// ─── Descriptors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_and_read_descriptors() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.replace_descriptors(
    identity.identity_id,
    vec![
      enrolled(Pose::Front, &[0.1, 0.2]),
      enrolled(Pose::Left, &[0.3, 0.4]),
      enrolled(Pose::Right, &[0.5, 0.6]),
    ],
  )
  .await
  .unwrap();

  let stored = s.enrolled_descriptors(identity.identity_id).await.unwrap();
  assert_eq!(stored.len(), 3);

  let front = stored.iter().find(|d| d.pose == Pose::Front).unwrap();
  assert_eq!(front.vector.as_slice(), &[0.1, 0.2]);
}

#[tokio::test]
async fn replacement_is_wholesale() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.replace_descriptors(
    identity.identity_id,
    vec![
      enrolled(Pose::Front, &[1.0]),
      enrolled(Pose::Left, &[2.0]),
      enrolled(Pose::Right, &[3.0]),
    ],
  )
  .await
  .unwrap();

  s.replace_descriptors(identity.identity_id, vec![enrolled(Pose::Front, &[9.0])])
    .await
    .unwrap();

  let stored = s.enrolled_descriptors(identity.identity_id).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].pose, Pose::Front);
  assert_eq!(stored[0].vector.as_slice(), &[9.0]);
}

#[tokio::test]
async fn replace_descriptors_unknown_identity_errors() {
  let s = store().await;
  let err = s
    .replace_descriptors(Uuid::new_v4(), vec![enrolled(Pose::Front, &[1.0])])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::IdentityNotFound(_)));
}

#[tokio::test]
async fn no_enrollment_reads_empty() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();
  let stored = s.enrolled_descriptors(identity.identity_id).await.unwrap();
  assert!(stored.is_empty());
}

// ─── Check-in ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn check_in_creates_open_record() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();
  let now = Utc::now();

  let record = s.check_in(identity.identity_id, now).await.unwrap();
  assert_eq!(record.identity_id, identity.identity_id);
  assert_eq!(record.status, AttendanceStatus::CheckedIn);
  assert_eq!(record.check_in_time, Some(now));
  assert!(record.check_out_time.is_none());
  assert!(record.legacy_entries.is_empty());
}

#[tokio::test]
async fn second_check_in_same_day_conflicts() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();
  let now = local_utc(2024, 6, 10, 9, 0, 0);

  s.check_in(identity.identity_id, now).await.unwrap();
  let err = s
    .check_in(identity.identity_id, local_utc(2024, 6, 10, 9, 5, 0))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Conflict(StateConflict::AlreadyCheckedIn)
  ));
}

#[tokio::test]
async fn concurrent_check_ins_admit_exactly_one() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();
  let now = Utc::now();

  let (a, b) = tokio::join!(
    s.check_in(identity.identity_id, now),
    s.check_in(identity.identity_id, now),
  );

  let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
  assert_eq!(winners, 1, "exactly one concurrent check-in may win");

  let loser = if a.is_err() { a } else { b };
  assert!(matches!(
    loser.unwrap_err(),
    Error::Conflict(StateConflict::AlreadyCheckedIn)
  ));

  let records = s.records_for_identity(identity.identity_id).await.unwrap();
  assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn check_ins_on_different_days_both_succeed() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.check_in(identity.identity_id, local_utc(2024, 6, 10, 9, 0, 0))
    .await
    .unwrap();
  s.check_in(identity.identity_id, local_utc(2024, 6, 11, 9, 0, 0))
    .await
    .unwrap();

  let records = s.records_for_identity(identity.identity_id).await.unwrap();
  assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn check_in_after_check_out_same_day_conflicts() {
  // Checked-out is terminal for the day.
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.check_in(identity.identity_id, local_utc(2024, 6, 10, 9, 0, 0))
    .await
    .unwrap();
  s.check_out(identity.identity_id, local_utc(2024, 6, 10, 17, 0, 0))
    .await
    .unwrap();

  let err = s
    .check_in(identity.identity_id, local_utc(2024, 6, 10, 18, 0, 0))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Conflict(StateConflict::AlreadyCheckedIn)
  ));
}

// ─── Check-out ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn check_out_closes_the_open_record() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();
  let check_in = local_utc(2024, 6, 10, 9, 0, 0);
  let check_out = local_utc(2024, 6, 10, 17, 30, 0);

  let opened = s.check_in(identity.identity_id, check_in).await.unwrap();
  let closed = s.check_out(identity.identity_id, check_out).await.unwrap();

  assert_eq!(closed.record_id, opened.record_id);
  assert_eq!(closed.status, AttendanceStatus::CheckedOut);
  assert_eq!(closed.check_out_time, Some(check_out));
}

#[tokio::test]
async fn check_out_without_check_in_errors() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  let err = s
    .check_out(identity.identity_id, Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Conflict(StateConflict::NoCheckInFound)
  ));
}

#[tokio::test]
async fn double_check_out_errors() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.check_in(identity.identity_id, local_utc(2024, 6, 10, 9, 0, 0))
    .await
    .unwrap();
  s.check_out(identity.identity_id, local_utc(2024, 6, 10, 17, 0, 0))
    .await
    .unwrap();

  let err = s
    .check_out(identity.identity_id, local_utc(2024, 6, 10, 17, 1, 0))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Conflict(StateConflict::AlreadyCheckedOut)
  ));
}

#[tokio::test]
async fn check_out_yesterday_closed_is_no_check_in_today() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.check_in(identity.identity_id, local_utc(2024, 6, 10, 9, 0, 0))
    .await
    .unwrap();
  s.check_out(identity.identity_id, local_utc(2024, 6, 10, 17, 0, 0))
    .await
    .unwrap();

  let err = s
    .check_out(identity.identity_id, local_utc(2024, 6, 11, 17, 0, 0))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Conflict(StateConflict::NoCheckInFound)
  ));
}

#[tokio::test]
async fn midnight_spanning_record_checks_out_as_its_check_in_day() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();
  let check_in = local_utc(2024, 6, 10, 23, 59, 59);
  let check_out = local_utc(2024, 6, 11, 0, 0, 1);

  let opened = s.check_in(identity.identity_id, check_in).await.unwrap();
  let closed = s.check_out(identity.identity_id, check_out).await.unwrap();
  assert_eq!(closed.record_id, opened.record_id);

  // One record, one roughly-zero-minute session — not two records.
  let records = s.records_for_identity(identity.identity_id).await.unwrap();
  assert_eq!(records.len(), 1);
  let sessions: Vec<_> = session::sessions(&records).collect();
  assert_eq!(sessions.len(), 1);
  assert_eq!(sessions[0].duration_minutes, 0);

  // The same-record repeat still reports an already-closed conflict.
  let err = s
    .check_out(identity.identity_id, local_utc(2024, 6, 11, 0, 0, 5))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Conflict(StateConflict::AlreadyCheckedOut)
  ));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn records_are_listed_newest_first() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.check_in(identity.identity_id, local_utc(2024, 6, 10, 9, 0, 0))
    .await
    .unwrap();
  s.check_out(identity.identity_id, local_utc(2024, 6, 10, 17, 0, 0))
    .await
    .unwrap();
  s.check_in(identity.identity_id, local_utc(2024, 6, 11, 8, 30, 0))
    .await
    .unwrap();

  let records = s.records_for_identity(identity.identity_id).await.unwrap();
  assert_eq!(records.len(), 2);
  assert!(records[0].check_in_time > records[1].check_in_time);
}

#[tokio::test]
async fn query_records_filters_by_status_and_day_range() {
  let s = store().await;
  let identity = s.add_identity(None).await.unwrap();

  s.check_in(identity.identity_id, local_utc(2024, 6, 10, 9, 0, 0))
    .await
    .unwrap();
  s.check_out(identity.identity_id, local_utc(2024, 6, 10, 17, 0, 0))
    .await
    .unwrap();
  s.check_in(identity.identity_id, local_utc(2024, 6, 12, 9, 0, 0))
    .await
    .unwrap();

  let open = s
    .query_records(&RecordQuery {
      identity: Some(identity.identity_id),
      status: Some(AttendanceStatus::CheckedIn),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].status, AttendanceStatus::CheckedIn);

  let early = s
    .query_records(&RecordQuery {
      identity: Some(identity.identity_id),
      from: Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()),
      to: Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(early.len(), 1);
  assert_eq!(early[0].status, AttendanceStatus::CheckedOut);
}

// ─── Legacy rows ─────────────────────────────────────────────────────────────

/// Insert a second-generation row (identity under `employee_id`, scalar
/// timestamps) straight into the table, bypassing the ledger.
async fn insert_gen1_row(
  s: &SqliteStore,
  employee: Uuid,
  check_in: DateTime<Utc>,
  check_out: Option<DateTime<Utc>>,
) {
  let employee_str = employee.hyphenated().to_string();
  let record_str = Uuid::new_v4().hyphenated().to_string();
  let in_str = check_in.to_rfc3339();
  let out_str = check_out.map(|t| t.to_rfc3339());
  let status = if check_out.is_some() { "checked-out" } else { "checked-in" };
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO attendance (
           record_id, employee_id, check_in_time, check_out_time, status,
           work_entries, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, '[]', ?3, ?3)",
        rusqlite::params![record_str, employee_str, in_str, out_str, status],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

/// Insert a first-generation row: no scalar timestamps at all, only a
/// free-form entries array.
async fn insert_gen0_row(s: &SqliteStore, employee: Uuid) {
  let employee_str = employee.hyphenated().to_string();
  let record_str = Uuid::new_v4().hyphenated().to_string();
  let now_str = Utc::now().to_rfc3339();
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO attendance (
           record_id, employee_id, status, work_entries, created_at, updated_at
         ) VALUES (?1, ?2, 'checked-in',
                   '[{\"in\":\"09:00\",\"out\":\"12:00\"}]', ?3, ?3)",
        rusqlite::params![record_str, employee_str, now_str],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn legacy_identity_column_resolves_canonically() {
  let s = store().await;
  let employee = Uuid::new_v4();
  insert_gen1_row(
    &s,
    employee,
    local_utc(2024, 6, 10, 9, 0, 0),
    Some(local_utc(2024, 6, 10, 17, 0, 0)),
  )
  .await;

  let records = s.records_for_identity(employee).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].identity_id, employee);
  assert_eq!(records[0].status, AttendanceStatus::CheckedOut);
}

#[tokio::test]
async fn gen0_rows_are_tolerated_and_excluded_from_sessions() {
  let s = store().await;
  let employee = Uuid::new_v4();
  insert_gen0_row(&s, employee).await;
  insert_gen1_row(
    &s,
    employee,
    local_utc(2024, 6, 10, 9, 0, 0),
    Some(local_utc(2024, 6, 10, 17, 30, 0)),
  )
  .await;

  let records = s.records_for_identity(employee).await.unwrap();
  assert_eq!(records.len(), 2, "raw listing keeps the timeless row");

  let entry_row = records
    .iter()
    .find(|r| !r.legacy_entries.is_empty())
    .expect("entries array survives the read untouched");
  assert!(entry_row.check_in_time.is_none());

  // Only the completed second-generation row projects to a session, and its
  // timestamps are never derived from the entries array.
  let sessions: Vec<_> = session::sessions(&records).collect();
  assert_eq!(sessions.len(), 1);
  assert_eq!(sessions[0].duration_minutes, 510);
}

#[tokio::test]
async fn legacy_open_row_can_be_checked_out() {
  let s = store().await;
  let employee = Uuid::new_v4();
  insert_gen1_row(&s, employee, local_utc(2024, 6, 10, 9, 0, 0), None).await;

  let closed = s
    .check_out(employee, local_utc(2024, 6, 10, 17, 0, 0))
    .await
    .unwrap();
  assert_eq!(closed.status, AttendanceStatus::CheckedOut);
  assert_eq!(closed.identity_id, employee);
}
