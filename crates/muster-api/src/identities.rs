//! Handlers for `/identities` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/identities` | All identities |
//! | `POST` | `/identities` | Body: `{"displayName": "..."}` (optional) |
//! | `GET`  | `/identities/:id` | 404 if not found |
//! | `PUT`  | `/identities/:id/descriptors` | Wholesale enrollment replacement |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use muster_core::{
  Error,
  descriptor::{Descriptor, EnrolledDescriptor, Pose},
  engine::VerifyEngine,
  identity::Identity,
  store::{AttendanceLedger, DescriptorStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List / create / get ─────────────────────────────────────────────────────

/// `GET /identities`
pub async fn list<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
) -> Result<Json<Vec<Identity>>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  let identities = engine.descriptor_store().list_identities().await?;
  Ok(Json(identities))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub display_name: Option<String>,
}

/// `POST /identities` — body: `{"displayName":"Alice"}`
pub async fn create<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  let identity = engine
    .descriptor_store()
    .add_identity(body.display_name)
    .await?;
  Ok((StatusCode::CREATED, Json(identity)))
}

/// `GET /identities/:id`
pub async fn get_one<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Identity>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  let identity = engine
    .descriptor_store()
    .get_identity(id)
    .await?
    .ok_or(Error::IdentityNotFound(id))?;
  Ok(Json(identity))
}

// ─── Enrollment ──────────────────────────────────────────────────────────────

/// Body for `PUT /identities/:id/descriptors` — wholesale replacement of
/// the enrolled set, one vector per supplied pose.
#[derive(Debug, Deserialize, Default)]
pub struct EnrollBody {
  pub front: Option<Vec<f64>>,
  pub left:  Option<Vec<f64>>,
  pub right: Option<Vec<f64>>,
}

/// `PUT /identities/:id/descriptors`
pub async fn replace_descriptors<D, L>(
  State(engine): State<Arc<VerifyEngine<D, L>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<EnrollBody>,
) -> Result<Json<Vec<EnrolledDescriptor>>, ApiError>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  let poses = [
    (Pose::Front, body.front),
    (Pose::Left, body.left),
    (Pose::Right, body.right),
  ];

  let mut descriptors = Vec::new();
  for (pose, raw) in poses {
    if let Some(components) = raw {
      descriptors.push(EnrolledDescriptor {
        pose,
        vector: Descriptor::new(components)?,
      });
    }
  }

  let stored = engine
    .descriptor_store()
    .replace_descriptors(id, descriptors)
    .await?;
  Ok(Json(stored))
}
