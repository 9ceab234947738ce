//! Handlers for verification and attendance reads.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/identities/:id/check-in`   | Body: `{"descriptor": number[]}` |
//! | `POST` | `/identities/:id/check-out`  | Body: `{"descriptor": number[]}` |
//! | `GET`  | `/identities/:id/attendance` | Raw records, newest first |
//! | `GET`  | `/identities/:id/sessions`   | Completed sessions only |
//! | `GET`  | `/attendance` | `?identity=&from=&to=&status=&limit=&offset=` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use muster_core::{
  Error,
  descriptor::Descriptor,
  engine::VerifyEngine,
  record::{AttendanceRecord, AttendanceStatus},
  session::{self, Session},
  store::{AttendanceLedger, DescriptorStore, RecordQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, response::Success};

// ─── Verification ────────────────────────────────────────────────────────────

/// Body accepted by check-in and check-out. The descriptor stays raw JSON
/// here and is parsed exactly once, so malformed input is rejected before
/// the matcher ever runs.
#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  #[serde(default)]
  pub descriptor: Option<serde_json::Value>,
}

/// `POST /identities/:id/check-in`
pub async fn check_in<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<VerifyBody>,
) -> Result<Json<Success<AttendanceRecord>>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  let live = Descriptor::parse(body.descriptor.as_ref())?;
  let record = engine.check_in(id, &live, Utc::now()).await?;
  Ok(Json(Success::new("Checked-in successfully", record)))
}

/// `POST /identities/:id/check-out`
pub async fn check_out<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<VerifyBody>,
) -> Result<Json<Success<AttendanceRecord>>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  let live = Descriptor::parse(body.descriptor.as_ref())?;
  let record = engine.check_out(id, &live, Utc::now()).await?;
  Ok(Json(Success::new("Checked-out successfully", record)))
}

// ─── Per-identity reads ──────────────────────────────────────────────────────

/// `GET /identities/:id/attendance` — raw ledger rows, open and legacy
/// included.
pub async fn list_for_identity<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  require_identity(&engine, id).await?;
  let records = engine.ledger().records_for_identity(id).await?;
  Ok(Json(records))
}

/// `GET /identities/:id/sessions` — completed sessions, derived on demand.
pub async fn list_sessions<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Session>>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  require_identity(&engine, id).await?;
  let records = engine.ledger().records_for_identity(id).await?;
  Ok(Json(session::sessions(&records).collect()))
}

async fn require_identity<D, L>(
  engine: &VerifyEngine<D, L>,
  id: Uuid,
) -> Result<(), ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  engine
    .descriptor_store()
    .get_identity(id)
    .await?
    .ok_or(Error::IdentityNotFound(id))?;
  Ok(())
}

// ─── Administrative listing ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct QueryParams {
  pub identity: Option<Uuid>,
  /// Inclusive day-bucket range bounds, `YYYY-MM-DD`.
  pub from:     Option<NaiveDate>,
  pub to:       Option<NaiveDate>,
  pub status:   Option<AttendanceStatus>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// `GET /attendance[?identity=...][&from=...][&to=...][&status=...]`
pub async fn query<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Query(params): Query<QueryParams>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  let query = RecordQuery {
    identity: params.identity,
    from:     params.from,
    to:       params.to,
    status:   params.status,
    limit:    params.limit,
    offset:   params.offset,
  };

  let records = engine.ledger().query_records(&query).await?;
  Ok(Json(records))
}
