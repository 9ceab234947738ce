//! Descriptor types — fixed-length numeric face vectors.
//!
//! Feature extraction happens outside this system. Descriptors arrive as
//! plain numeric arrays and are parsed exactly once, at the request
//! boundary, into [`Descriptor`]; the matcher never sees raw JSON.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Pose ────────────────────────────────────────────────────────────────────

/// The capture pose of an enrolled descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pose {
  Front,
  Left,
  Right,
}

impl Pose {
  pub const ALL: [Pose; 3] = [Pose::Front, Pose::Left, Pose::Right];
}

// ─── Descriptor ──────────────────────────────────────────────────────────────

/// A non-empty vector of finite `f64` components.
///
/// The length is a property of the enrollment pipeline, not of this engine;
/// equal-length descriptors are comparable, others are not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Descriptor(Vec<f64>);

impl Descriptor {
  /// Validate a raw component vector.
  pub fn new(components: Vec<f64>) -> Result<Self> {
    if components.is_empty() {
      return Err(Error::InputInvalid("descriptor is empty".into()));
    }
    if components.iter().any(|c| !c.is_finite()) {
      return Err(Error::InputInvalid(
        "descriptor contains non-finite values".into(),
      ));
    }
    Ok(Self(components))
  }

  /// Parse the `descriptor` field of a request body.
  ///
  /// An absent field, a non-array value, and non-numeric elements all fail
  /// with [`Error::InputInvalid`] before any matching occurs.
  pub fn parse(raw: Option<&serde_json::Value>) -> Result<Self> {
    let value = raw
      .filter(|v| !v.is_null())
      .ok_or_else(|| Error::InputInvalid("descriptor is missing".into()))?;
    let array = value.as_array().ok_or_else(|| {
      Error::InputInvalid("descriptor must be an array of numbers".into())
    })?;

    let mut components = Vec::with_capacity(array.len());
    for element in array {
      let n = element.as_f64().ok_or_else(|| {
        Error::InputInvalid("descriptor must contain only numbers".into())
      })?;
      components.push(n);
    }
    Self::new(components)
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn as_slice(&self) -> &[f64] { &self.0 }
}

// ─── Enrolled descriptor ─────────────────────────────────────────────────────

/// An enrolled reference descriptor, tagged with its capture pose.
/// Immutable once created; re-enrollment replaces an identity's full set
/// wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledDescriptor {
  pub pose:   Pose,
  pub vector: Descriptor,
}
