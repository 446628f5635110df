//! SQLite backend for the Vouch voucher ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Claims run inside `BEGIN IMMEDIATE`
//! transactions, so every writer sharing the database file is serialised on
//! the claim path.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
