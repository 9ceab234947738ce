//! Face-verified check-in/check-out orchestration.
//!
//! Loads the identity's enrolled descriptors, runs the matcher, and only on
//! an accepted match drives the attendance ledger. Reporting reads go
//! through the ledger directly; the engine is only the verification path.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  descriptor::Descriptor,
  matcher::{self, Acceptance, MatchConfig},
  record::AttendanceRecord,
  store::{AttendanceLedger, DescriptorStore},
};

/// Orchestrates descriptor verification and ledger transitions.
pub struct VerifyEngine<D, L> {
  descriptors: D,
  ledger:      L,
  config:      MatchConfig,
}

impl<D, L> VerifyEngine<D, L>
where
  D: DescriptorStore,
  L: AttendanceLedger,
{
  pub fn new(descriptors: D, ledger: L, config: MatchConfig) -> Self {
    Self { descriptors, ledger, config }
  }

  /// The reporting surface — read-only, never invoked inline with
  /// verification.
  pub fn ledger(&self) -> &L { &self.ledger }

  pub fn descriptor_store(&self) -> &D { &self.descriptors }

  /// Verify `live` against `identity` and open today's attendance record.
  pub async fn check_in(
    &self,
    identity: Uuid,
    live: &Descriptor,
    now: DateTime<Utc>,
  ) -> Result<AttendanceRecord> {
    let acceptance = self.verify(identity, live).await?;
    let record = self.ledger.check_in(identity, now).await?;
    tracing::info!(%identity, score = acceptance.score, "check-in accepted");
    Ok(record)
  }

  /// Verify `live` against `identity` and close its open record.
  pub async fn check_out(
    &self,
    identity: Uuid,
    live: &Descriptor,
    now: DateTime<Utc>,
  ) -> Result<AttendanceRecord> {
    let acceptance = self.verify(identity, live).await?;
    let record = self.ledger.check_out(identity, now).await?;
    tracing::info!(%identity, score = acceptance.score, "check-out accepted");
    Ok(record)
  }

  /// The shared verification step: identity existence, enrollment, match.
  async fn verify(&self, identity: Uuid, live: &Descriptor) -> Result<Acceptance> {
    self
      .descriptors
      .get_identity(identity)
      .await?
      .ok_or(Error::IdentityNotFound(identity))?;

    let enrolled = self.descriptors.enrolled_descriptors(identity).await?;

    matcher::verify(live, &enrolled, self.config).inspect_err(|e| {
      if let Error::AuthenticationFailed { score, threshold } = e {
        tracing::warn!(%identity, score, threshold, "descriptor rejected");
      }
    })
  }
}
