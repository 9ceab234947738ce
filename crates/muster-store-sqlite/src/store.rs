//! [`SqliteStore`] — the SQLite implementation of [`DescriptorStore`] and
//! [`AttendanceLedger`].

use std::path::Path;

use chrono::{DateTime, Utc};
use muster_core::{
  StateConflict,
  descriptor::EnrolledDescriptor,
  identity::Identity,
  record::{AttendanceRecord, AttendanceStatus, day_bucket},
  store::{AttendanceLedger, DescriptorStore, RecordQuery},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error,
  compat::{
    RawAttendanceRow, RawDescriptor, RawIdentity, encode_day, encode_dt,
    encode_pose, encode_status, encode_uuid, encode_vector,
  },
  schema::SCHEMA,
};

type CoreResult<T> = muster_core::Result<T>;

/// Wrap a connection-level failure for the storage seam.
fn db_err(e: tokio_rusqlite::Error) -> muster_core::Error {
  muster_core::Error::storage(Error::Database(e))
}

const RECORD_COLUMNS: &str =
  "record_id, identity_id, employee_id, check_in_time, check_out_time,
   status, work_entries, created_at, updated_at";

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAttendanceRow> {
  Ok(RawAttendanceRow {
    record_id:      row.get(0)?,
    identity_id:    row.get(1)?,
    employee_id:    row.get(2)?,
    check_in_time:  row.get(3)?,
    check_out_time: row.get(4)?,
    status:         row.get(5)?,
    work_entries:   row.get(6)?,
    created_at:     row.get(7)?,
    updated_at:     row.get(8)?,
  })
}

/// Outcome of the single-statement check-in insert. The uniqueness index on
/// (identity_id, check_in_day) decides the winner of a race; there is no
/// prior existence check to get out of sync with.
enum CheckInOutcome {
  Created,
  Conflict,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Muster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self, Error> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<(), Error> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The newest record for an identity, optionally restricted to the open
  /// (still checked-in) one. First-generation rows without a check-in time
  /// cannot be closed and are not considered.
  async fn latest_record(
    &self,
    identity: Uuid,
    open_only: bool,
  ) -> CoreResult<Option<AttendanceRecord>> {
    let identity_str = encode_uuid(identity);

    let raw: Option<RawAttendanceRow> = self
      .conn
      .call(move |conn| {
        let sql = if open_only {
          format!(
            "SELECT {RECORD_COLUMNS} FROM attendance
              WHERE COALESCE(identity_id, employee_id) = ?1
                AND status = 'checked-in'
                AND check_in_time IS NOT NULL
              ORDER BY check_in_time DESC LIMIT 1"
          )
        } else {
          format!(
            "SELECT {RECORD_COLUMNS} FROM attendance
              WHERE COALESCE(identity_id, employee_id) = ?1
                AND check_in_time IS NOT NULL
              ORDER BY check_in_time DESC LIMIT 1"
          )
        };

        Ok(
          conn
            .query_row(&sql, rusqlite::params![identity_str], row_to_raw)
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    Ok(raw.map(RawAttendanceRow::into_record).transpose()?)
  }
}

// ─── DescriptorStore impl ────────────────────────────────────────────────────

impl DescriptorStore for SqliteStore {
  async fn add_identity(&self, display_name: Option<String>) -> CoreResult<Identity> {
    let identity = Identity {
      identity_id: Uuid::new_v4(),
      display_name,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(identity.identity_id);
    let name     = identity.display_name.clone();
    let at_str   = encode_dt(identity.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (identity_id, display_name, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(identity)
  }

  async fn get_identity(&self, id: Uuid) -> CoreResult<Option<Identity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT identity_id, display_name, created_at
                 FROM identities WHERE identity_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawIdentity {
                  identity_id:  row.get(0)?,
                  display_name: row.get(1)?,
                  created_at:   row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    Ok(raw.map(RawIdentity::into_identity).transpose()?)
  }

  async fn list_identities(&self) -> CoreResult<Vec<Identity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT identity_id, display_name, created_at
             FROM identities ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawIdentity {
              identity_id:  row.get(0)?,
              display_name: row.get(1)?,
              created_at:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    Ok(
      raws
        .into_iter()
        .map(RawIdentity::into_identity)
        .collect::<Result<_, Error>>()?,
    )
  }

  async fn enrolled_descriptors(
    &self,
    identity: Uuid,
  ) -> CoreResult<Vec<EnrolledDescriptor>> {
    let identity_str = encode_uuid(identity);

    let raws: Vec<RawDescriptor> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT pose, vector_json FROM descriptors
            WHERE identity_id = ?1 ORDER BY pose",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![identity_str], |row| {
            Ok(RawDescriptor {
              pose:        row.get(0)?,
              vector_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    Ok(
      raws
        .into_iter()
        .map(RawDescriptor::into_enrolled)
        .collect::<Result<_, Error>>()?,
    )
  }

  async fn replace_descriptors(
    &self,
    identity: Uuid,
    descriptors: Vec<EnrolledDescriptor>,
  ) -> CoreResult<Vec<EnrolledDescriptor>> {
    self
      .get_identity(identity)
      .await?
      .ok_or(muster_core::Error::IdentityNotFound(identity))?;

    let identity_str = encode_uuid(identity);
    let at_str       = encode_dt(Utc::now());
    let rows = descriptors
      .iter()
      .map(|d| {
        Ok((
          encode_uuid(Uuid::new_v4()),
          encode_pose(d.pose).to_owned(),
          encode_vector(&d.vector)?,
        ))
      })
      .collect::<Result<Vec<_>, Error>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM descriptors WHERE identity_id = ?1",
          rusqlite::params![identity_str],
        )?;
        for (descriptor_id, pose, vector_json) in &rows {
          tx.execute(
            "INSERT INTO descriptors
               (descriptor_id, identity_id, pose, vector_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![descriptor_id, identity_str, pose, vector_json, at_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(descriptors)
  }
}

// ─── AttendanceLedger impl ───────────────────────────────────────────────────

impl AttendanceLedger for SqliteStore {
  async fn check_in(
    &self,
    identity: Uuid,
    now: DateTime<Utc>,
  ) -> CoreResult<AttendanceRecord> {
    let record = AttendanceRecord {
      record_id:      Uuid::new_v4(),
      identity_id:    identity,
      check_in_time:  Some(now),
      check_out_time: None,
      status:         AttendanceStatus::CheckedIn,
      legacy_entries: Vec::new(),
      created_at:     now,
      updated_at:     now,
    };

    let record_id_str = encode_uuid(record.record_id);
    let identity_str  = encode_uuid(identity);
    let now_str       = encode_dt(now);
    let day_str       = encode_day(day_bucket(now));

    let outcome = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO attendance (
             record_id, identity_id, check_in_time, status, check_in_day,
             work_entries, created_at, updated_at
           ) VALUES (?1, ?2, ?3, 'checked-in', ?4, '[]', ?3, ?3)",
          rusqlite::params![record_id_str, identity_str, now_str, day_str],
        ) {
          Ok(_) => Ok(CheckInOutcome::Created),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(CheckInOutcome::Conflict)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await
      .map_err(db_err)?;

    match outcome {
      CheckInOutcome::Created => Ok(record),
      CheckInOutcome::Conflict => Err(StateConflict::AlreadyCheckedIn.into()),
    }
  }

  async fn check_out(
    &self,
    identity: Uuid,
    now: DateTime<Utc>,
  ) -> CoreResult<AttendanceRecord> {
    // The open record, whichever day it was opened on: a session spanning
    // midnight is still addressable by its check-in day.
    if let Some(record) = self.latest_record(identity, true).await? {
      let record_id_str = encode_uuid(record.record_id);
      let now_str       = encode_dt(now);

      let updated = self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "UPDATE attendance
                SET check_out_time = ?1, status = 'checked-out', updated_at = ?1
              WHERE record_id = ?2 AND check_out_time IS NULL",
            rusqlite::params![now_str, record_id_str],
          )?)
        })
        .await
        .map_err(db_err)?;

      // Zero rows: a concurrent check-out closed it first.
      if updated == 0 {
        return Err(StateConflict::AlreadyCheckedOut.into());
      }

      return Ok(AttendanceRecord {
        check_out_time: Some(now),
        status: AttendanceStatus::CheckedOut,
        updated_at: now,
        ..record
      });
    }

    // No open record. Decide between "already closed today" and "nothing to
    // close today" from the newest record.
    let today = day_bucket(now);
    match self.latest_record(identity, false).await? {
      Some(record)
        if record.day() == Some(today)
          || record.check_out_time.map(day_bucket) == Some(today) =>
      {
        Err(StateConflict::AlreadyCheckedOut.into())
      }
      _ => Err(StateConflict::NoCheckInFound.into()),
    }
  }

  async fn records_for_identity(
    &self,
    identity: Uuid,
  ) -> CoreResult<Vec<AttendanceRecord>> {
    let identity_str = encode_uuid(identity);

    let raws: Vec<RawAttendanceRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM attendance
            WHERE COALESCE(identity_id, employee_id) = ?1
            ORDER BY check_in_time DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![identity_str], row_to_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    Ok(
      raws
        .into_iter()
        .map(RawAttendanceRow::into_record)
        .collect::<Result<_, Error>>()?,
    )
  }

  async fn query_records(
    &self,
    query: &RecordQuery,
  ) -> CoreResult<Vec<AttendanceRecord>> {
    let identity_str = query.identity.map(encode_uuid);
    let from_str     = query.from.map(encode_day);
    let to_str       = query.to.map(encode_day);
    let status_str   = query.status.map(encode_status).map(str::to_owned);
    let limit_val    = query.limit.unwrap_or(100) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawAttendanceRow> = self
      .conn
      .call(move |conn| {
        // Build the WHERE clause dynamically.
        let mut conds: Vec<&'static str> = vec![];
        if identity_str.is_some() {
          conds.push("COALESCE(identity_id, employee_id) = ?1");
        }
        if from_str.is_some() {
          conds.push("check_in_day >= ?2");
        }
        if to_str.is_some() {
          conds.push("check_in_day <= ?3");
        }
        if status_str.is_some() {
          conds.push("status = ?4");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {RECORD_COLUMNS} FROM attendance
           {where_clause}
           ORDER BY check_in_time DESC LIMIT ?5 OFFSET ?6"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              identity_str.as_deref(),
              from_str.as_deref(),
              to_str.as_deref(),
              status_str.as_deref(),
              limit_val,
              offset_val,
            ],
            row_to_raw,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    Ok(
      raws
        .into_iter()
        .map(RawAttendanceRow::into_record)
        .collect::<Result<_, Error>>()?,
    )
  }
}
