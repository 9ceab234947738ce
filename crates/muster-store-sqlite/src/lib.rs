//! SQLite backend for the Muster descriptor store and attendance ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The legacy-shape shim lives
//! entirely in [`compat`]; nothing above this crate sees historical column
//! names.

mod compat;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
