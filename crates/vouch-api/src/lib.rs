//! JSON REST API for Vouch.
//!
//! Exposes an axum [`Router`] backed by a [`Ledger`] over any
//! [`LedgerStore`]. Authentication, TLS and transport concerns are the
//! caller's responsibility; the caller's account arrives in the
//! `X-Account-Id` header (see [`account`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vouch_api::api_router(ledger.clone()))
//! ```

pub mod account;
pub mod claims;
pub mod error;
pub mod venues;
pub mod vouchers;

use axum::{
  Router,
  routing::{get, post},
};
use vouch_core::{Ledger, store::LedgerStore};

pub use account::{ACCOUNT_HEADER, Account};
pub use error::ApiError;

/// Build a fully-materialised API router for `ledger`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(ledger: Ledger<S>) -> Router<()>
where
  S: LedgerStore + 'static,
{
  Router::new()
    // Venues
    .route("/venues", post(venues::create::<S>))
    .route("/venues/{id}", get(venues::get_one::<S>))
    // Vouchers
    .route("/vouchers", get(vouchers::list::<S>).post(vouchers::create::<S>))
    .route("/vouchers/mine", get(vouchers::mine::<S>))
    .route(
      "/vouchers/{id}",
      get(vouchers::get_one::<S>)
        .put(vouchers::update::<S>)
        .delete(vouchers::delete_one::<S>),
    )
    .route("/vouchers/{id}/status", get(vouchers::status::<S>))
    .route("/vouchers/{id}/claim", post(vouchers::claim::<S>))
    // Claims
    .route("/claims", get(claims::list::<S>))
    .with_state(ledger)
}
