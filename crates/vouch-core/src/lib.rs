//! Core types and trait definitions for the Vouch voucher ledger.
//!
//! This crate has no HTTP or database dependencies.
//! Storage backends implement [`store::LedgerStore`]; the [`Ledger`] service
//! layers the claim protocol and voucher management on top of any backend.

pub mod claim;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod store;
pub mod venue;
pub mod voucher;

pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerError};
