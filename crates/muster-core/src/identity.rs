//! Identity — the thin envelope descriptors and attendance records hang off.
//!
//! An identity holds no biometric data itself; enrolled descriptors live in
//! the descriptor store and attendance history in the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque person reference. Eligible for verification only once at least
/// one descriptor is enrolled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub identity_id:  Uuid,
  pub display_name: Option<String>,
  pub created_at:   DateTime<Utc>,
}
