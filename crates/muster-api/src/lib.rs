//! JSON REST API for the Muster attendance engine.
//!
//! Exposes an axum [`Router`] backed by a [`VerifyEngine`] over any store
//! pair. Caller authentication and transport security are the caller's
//! responsibility; identities arrive already resolved in the path.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", muster_api::api_router(engine.clone()))
//! ```

pub mod attendance;
pub mod error;
pub mod identities;
pub mod response;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use muster_core::{
  engine::VerifyEngine,
  store::{AttendanceLedger, DescriptorStore},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<D, L>(engine: Arc<VerifyEngine<D, L>>) -> Router<()>
where
  D: DescriptorStore + 'static,
  L: AttendanceLedger + 'static,
{
  Router::new()
    // Identities and enrollment
    .route(
      "/identities",
      get(identities::list::<D, L>).post(identities::create::<D, L>),
    )
    .route("/identities/{id}", get(identities::get_one::<D, L>))
    .route(
      "/identities/{id}/descriptors",
      put(identities::replace_descriptors::<D, L>),
    )
    // Verification
    .route("/identities/{id}/check-in", post(attendance::check_in::<D, L>))
    .route("/identities/{id}/check-out", post(attendance::check_out::<D, L>))
    // Reporting reads
    .route(
      "/identities/{id}/attendance",
      get(attendance::list_for_identity::<D, L>),
    )
    .route("/identities/{id}/sessions", get(attendance::list_sessions::<D, L>))
    .route("/attendance", get(attendance::query::<D, L>))
    .with_state(engine)
}

// ─── Integration tests ───────────────────────────────────────────────────────
