//! Claim records and the outcome of a single claim attempt.
//!
//! A claim record is a snapshot, not a live reference: the code, discount and
//! venue name are copied from the voucher at claim time, so the record stays
//! meaningful after the voucher is edited or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::voucher::Phase;

/// One account's claim on one unit of a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
  pub claim_id:                  Uuid,
  pub account_id:                Uuid,
  pub voucher_id:                Uuid,
  pub claimed_at:                DateTime<Utc>,
  /// The voucher's `valid_until` at claim time.
  pub expires_at:                DateTime<Utc>,
  pub snapshot_code:             String,
  pub snapshot_discount_percent: u8,
  pub snapshot_venue_name:       Option<String>,
}

impl ClaimRecord {
  /// A record stays live up to and including its expiry instant.
  pub fn is_live_at(&self, now: DateTime<Utc>) -> bool { self.expires_at >= now }
}

/// Why a store refused to apply a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRejection {
  NotFound,
  /// The voucher is upcoming or expired.
  NotClaimable(Phase),
  AlreadyClaimed,
  Exhausted,
}

/// The result of one atomic claim attempt against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimAttempt {
  Claimed(ClaimRecord),
  Rejected(ClaimRejection),
  /// The attempt lost a race at the storage layer and changed nothing. Safe
  /// to retry.
  Conflict,
}
