//! Core types and trait definitions for the Muster attendance engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod record;
pub mod session;
pub mod store;

pub use error::{Error, Result, StateConflict};
