//! The `LedgerStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `vouch-store-sqlite`).
//! Higher layers (`vouch-api`, `vouch-server`) go through [`crate::Ledger`],
//! which depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  claim::{ClaimAttempt, ClaimRecord},
  venue::{NewVenue, Venue},
  voucher::{NewVoucher, Voucher, VoucherUpdate},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`LedgerStore::list_vouchers`]. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct VoucherQuery {
  pub venue_id:     Option<Uuid>,
  /// Restrict to vouchers at venues owned by this account.
  pub owner_id:     Option<Uuid>,
  /// Restrict to vouchers that are active at this instant.
  pub claimable_at: Option<DateTime<Utc>>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

// ─── Write outcome ───────────────────────────────────────────────────────────

/// Outcome of a voucher write subject to the unique-code constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoucherWrite {
  Written(Voucher),
  /// The referenced row is gone: the venue on create, the voucher on update.
  Missing,
  /// Another voucher already uses the code.
  CodeTaken,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a voucher ledger backend.
///
/// Every time-dependent method takes `now` explicitly; backends never read
/// the clock for anything but record timestamps.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Venues ────────────────────────────────────────────────────────────

  fn add_venue(
    &self,
    input: NewVenue,
  ) -> impl Future<Output = Result<Venue, Self::Error>> + Send + '_;

  fn get_venue(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Venue>, Self::Error>> + Send + '_;

  // ── Vouchers ──────────────────────────────────────────────────────────

  /// Persist a new voucher with `quantity_claimed = 0`.
  fn create_voucher(
    &self,
    input: NewVoucher,
  ) -> impl Future<Output = Result<VoucherWrite, Self::Error>> + Send + '_;

  fn get_voucher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Voucher>, Self::Error>> + Send + '_;

  /// Replace a voucher's editable fields. Never touches the counters.
  fn update_voucher(
    &self,
    id: Uuid,
    update: VoucherUpdate,
  ) -> impl Future<Output = Result<VoucherWrite, Self::Error>> + Send + '_;

  /// Remove a voucher. Existing claim records are kept. Returns `false` if
  /// the voucher did not exist.
  fn delete_voucher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_vouchers<'a>(
    &'a self,
    query: &'a VoucherQuery,
  ) -> impl Future<Output = Result<Vec<Voucher>, Self::Error>> + Send + 'a;

  // ── Claims ────────────────────────────────────────────────────────────

  /// The account's live claim on the voucher, if any.
  fn live_claim(
    &self,
    account_id: Uuid,
    voucher_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<ClaimRecord>, Self::Error>> + Send + '_;

  /// Make one atomic claim attempt.
  ///
  /// The phase gate, the live-claim check, the conditional increment of
  /// `quantity_claimed` and the insertion of the record must be applied as a
  /// single unit with respect to every other writer. Either all of it is
  /// visible afterwards or none of it is.
  fn try_claim(
    &self,
    voucher_id: Uuid,
    account_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<ClaimAttempt, Self::Error>> + Send + '_;

  /// Retire the account's claim records that expired before `now` and return
  /// the surviving live records, oldest first.
  ///
  /// Retiring a record never gives its unit back to the voucher.
  fn sweep_claims(
    &self,
    account_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<ClaimRecord>, Self::Error>> + Send + '_;
}
