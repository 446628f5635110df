//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (nanosecond
//! precision, `Z` suffix) so that SQL string comparison orders them
//! chronologically. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;
use vouch_core::{claim::ClaimRecord, venue::Venue, voucher::Voucher};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Voucher columns in [`RawVoucher::from_row`] order; the table alias is `v`.
pub const VOUCHER_COLUMNS: &str = "v.voucher_id, v.code, v.discount_percent, \
  v.quantity_total, v.quantity_claimed, v.valid_from, v.valid_until, \
  v.venue_id, v.conditions, v.created_at";

/// Claim columns in [`RawClaim::from_row`] order.
pub const CLAIM_COLUMNS: &str = "claim_id, account_id, voucher_id, claimed_at, \
  expires_at, snapshot_code, snapshot_discount_percent, snapshot_venue_name";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `venues` row.
pub struct RawVenue {
  pub venue_id:   String,
  pub owner_id:   String,
  pub name:       String,
  pub created_at: String,
}

impl RawVenue {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      venue_id:   row.get(0)?,
      owner_id:   row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_venue(self) -> Result<Venue> {
    Ok(Venue {
      venue_id:   decode_uuid(&self.venue_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `vouchers` row.
pub struct RawVoucher {
  pub voucher_id:       String,
  pub code:             String,
  pub discount_percent: u8,
  pub quantity_total:   u32,
  pub quantity_claimed: u32,
  pub valid_from:       String,
  pub valid_until:      String,
  pub venue_id:         String,
  pub conditions:       Option<String>,
  pub created_at:       String,
}

impl RawVoucher {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      voucher_id:       row.get(0)?,
      code:             row.get(1)?,
      discount_percent: row.get(2)?,
      quantity_total:   row.get(3)?,
      quantity_claimed: row.get(4)?,
      valid_from:       row.get(5)?,
      valid_until:      row.get(6)?,
      venue_id:         row.get(7)?,
      conditions:       row.get(8)?,
      created_at:       row.get(9)?,
    })
  }

  pub fn into_voucher(self) -> Result<Voucher> {
    Ok(Voucher {
      voucher_id:       decode_uuid(&self.voucher_id)?,
      code:             self.code,
      discount_percent: self.discount_percent,
      quantity_total:   self.quantity_total,
      quantity_claimed: self.quantity_claimed,
      valid_from:       decode_dt(&self.valid_from)?,
      valid_until:      decode_dt(&self.valid_until)?,
      venue_id:         decode_uuid(&self.venue_id)?,
      conditions:       self.conditions,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `claims` row.
pub struct RawClaim {
  pub claim_id:                  String,
  pub account_id:                String,
  pub voucher_id:                String,
  pub claimed_at:                String,
  pub expires_at:                String,
  pub snapshot_code:             String,
  pub snapshot_discount_percent: u8,
  pub snapshot_venue_name:       Option<String>,
}

impl RawClaim {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      claim_id:                  row.get(0)?,
      account_id:                row.get(1)?,
      voucher_id:                row.get(2)?,
      claimed_at:                row.get(3)?,
      expires_at:                row.get(4)?,
      snapshot_code:             row.get(5)?,
      snapshot_discount_percent: row.get(6)?,
      snapshot_venue_name:       row.get(7)?,
    })
  }

  pub fn into_claim(self) -> Result<ClaimRecord> {
    Ok(ClaimRecord {
      claim_id:                  decode_uuid(&self.claim_id)?,
      account_id:                decode_uuid(&self.account_id)?,
      voucher_id:                decode_uuid(&self.voucher_id)?,
      claimed_at:                decode_dt(&self.claimed_at)?,
      expires_at:                decode_dt(&self.expires_at)?,
      snapshot_code:             self.snapshot_code,
      snapshot_discount_percent: self.snapshot_discount_percent,
      snapshot_venue_name:       self.snapshot_venue_name,
    })
  }
}
