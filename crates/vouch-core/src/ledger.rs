//! [`Ledger`]: the voucher claim protocol and voucher management on top of
//! any [`LedgerStore`].
//!
//! The ledger owns no mutable state of its own. Every decision that must be
//! atomic is delegated to [`LedgerStore::try_claim`]; the ledger only retries
//! attempts the store reports as [`ClaimAttempt::Conflict`] and translates
//! rejections into [`LedgerError`]s.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  claim::{ClaimAttempt, ClaimRecord, ClaimRejection},
  clock::{Clock, SystemClock},
  store::{LedgerStore, VoucherQuery, VoucherWrite},
  venue::{NewVenue, Venue},
  voucher::{NewVoucher, Phase, Voucher, VoucherStatus, VoucherUpdate},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LedgerError {
  #[error("voucher not found: {0}")]
  NotFound(Uuid),

  #[error("venue not found: {0}")]
  VenueNotFound(Uuid),

  #[error("voucher {voucher_id} is not claimable: {phase}")]
  NotClaimable { voucher_id: Uuid, phase: Phase },

  #[error("account {account_id} already holds a live claim on voucher {voucher_id}")]
  AlreadyClaimed { voucher_id: Uuid, account_id: Uuid },

  #[error("voucher {0} has no remaining quantity")]
  Exhausted(Uuid),

  #[error("account {account_id} does not own venue {venue_id}")]
  Forbidden { account_id: Uuid, venue_id: Uuid },

  #[error("voucher code {0:?} is already in use")]
  DuplicateCode(String),

  #[error("invalid input: {0}")]
  Invalid(#[from] crate::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
  fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }

  fn from_rejection(
    rejection: ClaimRejection,
    voucher_id: Uuid,
    account_id: Uuid,
  ) -> Self {
    match rejection {
      ClaimRejection::NotFound => Self::NotFound(voucher_id),
      ClaimRejection::NotClaimable(phase) => Self::NotClaimable { voucher_id, phase },
      ClaimRejection::AlreadyClaimed => Self::AlreadyClaimed { voucher_id, account_id },
      ClaimRejection::Exhausted => Self::Exhausted(voucher_id),
    }
  }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// The voucher ledger service.
///
/// Cloning is cheap; clones share the store and the clock.
pub struct Ledger<S> {
  store:        Arc<S>,
  clock:        Arc<dyn Clock>,
  max_attempts: u32,
}

impl<S> Clone for Ledger<S> {
  fn clone(&self) -> Self {
    Self {
      store:        Arc::clone(&self.store),
      clock:        Arc::clone(&self.clock),
      max_attempts: self.max_attempts,
    }
  }
}

impl<S: LedgerStore> Ledger<S> {
  /// How many times a conflicting claim attempt is made before giving up.
  pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      clock: Arc::new(SystemClock),
      max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Values below 1 are treated as 1.
  pub fn with_max_attempts(mut self, attempts: u32) -> Self {
    self.max_attempts = attempts.max(1);
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  // ── Claim protocol ────────────────────────────────────────────────────

  /// Compute the voucher's status for `account_id` without mutating anything.
  pub async fn status(
    &self,
    voucher_id: Uuid,
    account_id: Uuid,
  ) -> Result<VoucherStatus> {
    let now = self.clock.now();
    let voucher = self.require_voucher(voucher_id).await?;
    let venue_name = self
      .store
      .get_venue(voucher.venue_id)
      .await
      .map_err(LedgerError::store)?
      .map(|v| v.name);
    let already_claimed = self
      .store
      .live_claim(account_id, voucher_id, now)
      .await
      .map_err(LedgerError::store)?
      .is_some();
    Ok(VoucherStatus::new(&voucher, now, already_claimed, venue_name))
  }

  /// Claim one unit of a voucher for `account_id`.
  ///
  /// Storage conflicts are retried up to the configured attempt limit. If
  /// every attempt conflicts, the caller gets `AlreadyClaimed` when a live
  /// claim exists by then and `Exhausted` otherwise.
  pub async fn claim(
    &self,
    voucher_id: Uuid,
    account_id: Uuid,
  ) -> Result<ClaimRecord> {
    for attempt in 1..=self.max_attempts {
      let now = self.clock.now();
      let outcome = self
        .store
        .try_claim(voucher_id, account_id, now)
        .await
        .map_err(LedgerError::store)?;

      match outcome {
        ClaimAttempt::Claimed(record) => {
          tracing::info!(
            %voucher_id,
            %account_id,
            claim_id = %record.claim_id,
            code = %record.snapshot_code,
            "voucher claimed"
          );
          return Ok(record);
        }
        ClaimAttempt::Rejected(rejection) => {
          tracing::debug!(%voucher_id, %account_id, ?rejection, "claim rejected");
          return Err(LedgerError::from_rejection(rejection, voucher_id, account_id));
        }
        ClaimAttempt::Conflict => {
          tracing::debug!(%voucher_id, %account_id, attempt, "claim conflicted, retrying");
        }
      }
    }

    tracing::warn!(
      %voucher_id,
      %account_id,
      attempts = self.max_attempts,
      "claim attempts exhausted by storage conflicts"
    );

    let held = self
      .store
      .live_claim(account_id, voucher_id, self.clock.now())
      .await
      .map_err(LedgerError::store)?;
    match held {
      Some(_) => Err(LedgerError::AlreadyClaimed { voucher_id, account_id }),
      None => Err(LedgerError::Exhausted(voucher_id)),
    }
  }

  /// Retire the account's expired claim records and return the live ones.
  pub async fn expire_stale_claims(&self, account_id: Uuid) -> Result<Vec<ClaimRecord>> {
    let now = self.clock.now();
    let live = self
      .store
      .sweep_claims(account_id, now)
      .await
      .map_err(LedgerError::store)?;
    tracing::debug!(%account_id, live = live.len(), "swept stale claims");
    Ok(live)
  }

  /// The account's live claims. Stale records are swept first.
  pub async fn list_active_claims(&self, account_id: Uuid) -> Result<Vec<ClaimRecord>> {
    self.expire_stale_claims(account_id).await
  }

  // ── Venues ────────────────────────────────────────────────────────────

  pub async fn register_venue(&self, owner_id: Uuid, name: String) -> Result<Venue> {
    let input = NewVenue { owner_id, name }.validate()?;
    let venue = self.store.add_venue(input).await.map_err(LedgerError::store)?;
    tracing::info!(venue_id = %venue.venue_id, %owner_id, "venue registered");
    Ok(venue)
  }

  pub async fn get_venue(&self, venue_id: Uuid) -> Result<Venue> {
    self
      .store
      .get_venue(venue_id)
      .await
      .map_err(LedgerError::store)?
      .ok_or(LedgerError::VenueNotFound(venue_id))
  }

  // ── Voucher management ────────────────────────────────────────────────

  pub async fn get_voucher(&self, voucher_id: Uuid) -> Result<Voucher> {
    self.require_voucher(voucher_id).await
  }

  /// Create a voucher at a venue owned by `owner_id`.
  pub async fn create_voucher(&self, owner_id: Uuid, input: NewVoucher) -> Result<Voucher> {
    let input = input.validate()?;
    self.require_owned_venue(owner_id, input.venue_id).await?;

    let code = input.code.clone();
    let venue_id = input.venue_id;
    match self.store.create_voucher(input).await.map_err(LedgerError::store)? {
      VoucherWrite::Written(voucher) => {
        tracing::info!(voucher_id = %voucher.voucher_id, code = %voucher.code, "voucher created");
        Ok(voucher)
      }
      VoucherWrite::Missing => Err(LedgerError::VenueNotFound(venue_id)),
      VoucherWrite::CodeTaken => Err(LedgerError::DuplicateCode(code)),
    }
  }

  pub async fn update_voucher(
    &self,
    owner_id: Uuid,
    voucher_id: Uuid,
    update: VoucherUpdate,
  ) -> Result<Voucher> {
    let update = update.validate()?;
    let existing = self.require_voucher(voucher_id).await?;
    self.require_owned_venue(owner_id, existing.venue_id).await?;

    let code = update.code.clone();
    match self
      .store
      .update_voucher(voucher_id, update)
      .await
      .map_err(LedgerError::store)?
    {
      VoucherWrite::Written(voucher) => {
        tracing::info!(%voucher_id, "voucher updated");
        Ok(voucher)
      }
      VoucherWrite::Missing => Err(LedgerError::NotFound(voucher_id)),
      VoucherWrite::CodeTaken => Err(LedgerError::DuplicateCode(code)),
    }
  }

  /// Delete a voucher. Claim records made against it are kept.
  pub async fn delete_voucher(&self, owner_id: Uuid, voucher_id: Uuid) -> Result<()> {
    let existing = self.require_voucher(voucher_id).await?;
    self.require_owned_venue(owner_id, existing.venue_id).await?;

    if !self
      .store
      .delete_voucher(voucher_id)
      .await
      .map_err(LedgerError::store)?
    {
      return Err(LedgerError::NotFound(voucher_id));
    }
    tracing::info!(%voucher_id, "voucher deleted");
    Ok(())
  }

  /// Vouchers that can be claimed right now, newest first.
  pub async fn claimable_vouchers(
    &self,
    limit: Option<usize>,
    offset: Option<usize>,
  ) -> Result<Vec<Voucher>> {
    let query = VoucherQuery {
      claimable_at: Some(self.clock.now()),
      limit,
      offset,
      ..VoucherQuery::default()
    };
    self.store.list_vouchers(&query).await.map_err(LedgerError::store)
  }

  /// Every voucher across the venues `owner_id` owns, newest first.
  pub async fn owner_vouchers(&self, owner_id: Uuid) -> Result<Vec<Voucher>> {
    let query = VoucherQuery { owner_id: Some(owner_id), ..VoucherQuery::default() };
    self.store.list_vouchers(&query).await.map_err(LedgerError::store)
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn require_voucher(&self, voucher_id: Uuid) -> Result<Voucher> {
    self
      .store
      .get_voucher(voucher_id)
      .await
      .map_err(LedgerError::store)?
      .ok_or(LedgerError::NotFound(voucher_id))
  }

  async fn require_owned_venue(&self, account_id: Uuid, venue_id: Uuid) -> Result<Venue> {
    let venue = self.get_venue(venue_id).await?;
    if venue.owner_id != account_id {
      return Err(LedgerError::Forbidden { account_id, venue_id });
    }
    Ok(venue)
  }
}
