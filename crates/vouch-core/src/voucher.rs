//! Vouchers: discount offers with a capped claimable quantity and a validity
//! window.
//!
//! A voucher's phase is never stored. It is derived at read time from the
//! validity window and the claim counters, so it can never drift out of sync
//! with them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const CODE_MIN_LEN: usize = 3;
pub const CODE_MAX_LEN: usize = 20;
pub const CONDITIONS_MAX_LEN: usize = 300;
pub const MAX_DISCOUNT_PERCENT: u8 = 100;

// ─── Phase ───────────────────────────────────────────────────────────────────

/// The time- and quantity-derived state of a voucher.
///
/// ```text
/// upcoming --(now >= valid_from)--> active --(claimed == total)--> exhausted
/// active    --(now > valid_until)--> expired
/// exhausted --(now > valid_until)--> expired
/// ```
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
  Upcoming,
  Active,
  Exhausted,
  Expired,
}

impl Phase {
  /// Only an active voucher accepts new claims.
  pub fn is_claimable(self) -> bool { matches!(self, Self::Active) }
}

// ─── Voucher ─────────────────────────────────────────────────────────────────

/// A persisted voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
  pub voucher_id:       Uuid,
  /// Upper-case, unique across all vouchers.
  pub code:             String,
  pub discount_percent: u8,
  /// Fixed at creation.
  pub quantity_total:   u32,
  /// Only ever incremented, and only by the claim protocol.
  pub quantity_claimed: u32,
  pub valid_from:       DateTime<Utc>,
  pub valid_until:      DateTime<Utc>,
  pub venue_id:         Uuid,
  pub conditions:       Option<String>,
  pub created_at:       DateTime<Utc>,
}

impl Voucher {
  /// The phase of this voucher as of `now`.
  ///
  /// The window is checked before the counters: a voucher that is both sold
  /// out and past its end date reports `Expired`.
  pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
    if now < self.valid_from {
      Phase::Upcoming
    } else if now > self.valid_until {
      Phase::Expired
    } else if self.quantity_claimed >= self.quantity_total {
      Phase::Exhausted
    } else {
      Phase::Active
    }
  }

  pub fn remaining(&self) -> u32 {
    self.quantity_total.saturating_sub(self.quantity_claimed)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::LedgerStore::create_voucher`].
///
/// `quantity_claimed` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewVoucher {
  pub code:             String,
  pub discount_percent: u8,
  pub quantity_total:   u32,
  pub valid_from:       DateTime<Utc>,
  pub valid_until:      DateTime<Utc>,
  pub venue_id:         Uuid,
  pub conditions:       Option<String>,
}

impl NewVoucher {
  /// Normalise the code and conditions, and check every field's bounds.
  pub fn validate(self) -> Result<Self> {
    if self.quantity_total == 0 {
      return Err(Error::ZeroQuantity);
    }
    check_discount(self.discount_percent)?;
    check_window(self.valid_from, self.valid_until)?;
    Ok(Self {
      code: normalize_code(&self.code)?,
      conditions: normalize_conditions(self.conditions)?,
      ..self
    })
  }
}

/// Replacement values for a voucher's editable fields.
///
/// The quantity total and the claim counter are not editable.
#[derive(Debug, Clone)]
pub struct VoucherUpdate {
  pub code:             String,
  pub discount_percent: u8,
  pub valid_from:       DateTime<Utc>,
  pub valid_until:      DateTime<Utc>,
  pub conditions:       Option<String>,
}

impl VoucherUpdate {
  pub fn validate(self) -> Result<Self> {
    check_discount(self.discount_percent)?;
    check_window(self.valid_from, self.valid_until)?;
    Ok(Self {
      code: normalize_code(&self.code)?,
      conditions: normalize_conditions(self.conditions)?,
      ..self
    })
  }
}

/// Trim and upper-case a voucher code, then check its length.
pub fn normalize_code(raw: &str) -> Result<String> {
  let code = raw.trim().to_uppercase();
  let len = code.chars().count();
  if !(CODE_MIN_LEN..=CODE_MAX_LEN).contains(&len) {
    return Err(Error::CodeLength(len));
  }
  Ok(code)
}

fn normalize_conditions(raw: Option<String>) -> Result<Option<String>> {
  let Some(text) = raw else { return Ok(None) };
  let text = text.trim();
  let len = text.chars().count();
  if len > CONDITIONS_MAX_LEN {
    return Err(Error::ConditionsTooLong(len));
  }
  Ok((len > 0).then(|| text.to_owned()))
}

fn check_discount(percent: u8) -> Result<()> {
  if percent == 0 || percent > MAX_DISCOUNT_PERCENT {
    return Err(Error::DiscountOutOfRange(percent));
  }
  Ok(())
}

fn check_window(from: DateTime<Utc>, until: DateTime<Utc>) -> Result<()> {
  if from >= until {
    return Err(Error::EmptyWindow { from, until });
  }
  Ok(())
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// A read-only snapshot of a voucher from one account's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherStatus {
  pub voucher_id:       Uuid,
  pub phase:            Phase,
  pub remaining:        u32,
  pub quantity_total:   u32,
  pub quantity_claimed: u32,
  /// Whether the account holds a live claim on this voucher.
  pub already_claimed:  bool,
  pub code:             String,
  pub discount_percent: u8,
  /// When a claim made now would expire.
  pub expires_at:       DateTime<Utc>,
  pub venue_name:       Option<String>,
}

impl VoucherStatus {
  pub fn new(
    voucher: &Voucher,
    now: DateTime<Utc>,
    already_claimed: bool,
    venue_name: Option<String>,
  ) -> Self {
    Self {
      voucher_id: voucher.voucher_id,
      phase: voucher.phase_at(now),
      remaining: voucher.remaining(),
      quantity_total: voucher.quantity_total,
      quantity_claimed: voucher.quantity_claimed,
      already_claimed,
      code: voucher.code.clone(),
      discount_percent: voucher.discount_percent,
      expires_at: voucher.valid_until,
      venue_name,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn voucher(claimed: u32, total: u32) -> Voucher {
    Voucher {
      voucher_id:       Uuid::nil(),
      code:             "SUMMER10".into(),
      discount_percent: 10,
      quantity_total:   total,
      quantity_claimed: claimed,
      valid_from:       at(1_000),
      valid_until:      at(2_000),
      venue_id:         Uuid::nil(),
      conditions:       None,
      created_at:       at(0),
    }
  }

  fn new_voucher() -> NewVoucher {
    NewVoucher {
      code:             "  summer10 ".into(),
      discount_percent: 10,
      quantity_total:   5,
      valid_from:       at(1_000),
      valid_until:      at(2_000),
      venue_id:         Uuid::nil(),
      conditions:       Some("  dine-in only ".into()),
    }
  }

  #[test]
  fn phase_follows_window_and_counters() {
    let v = voucher(0, 2);
    assert_eq!(v.phase_at(at(999)), Phase::Upcoming);
    assert_eq!(v.phase_at(at(1_000)), Phase::Active);
    assert_eq!(v.phase_at(at(2_000)), Phase::Active);
    assert_eq!(v.phase_at(at(2_001)), Phase::Expired);

    let full = voucher(2, 2);
    assert_eq!(full.phase_at(at(1_500)), Phase::Exhausted);
    assert_eq!(full.phase_at(at(2_001)), Phase::Expired);
    assert_eq!(full.phase_at(at(500)), Phase::Upcoming);
  }

  #[test]
  fn only_active_is_claimable() {
    assert!(Phase::Active.is_claimable());
    assert!(!Phase::Upcoming.is_claimable());
    assert!(!Phase::Exhausted.is_claimable());
    assert!(!Phase::Expired.is_claimable());
  }

  #[test]
  fn phase_string_forms() {
    assert_eq!(Phase::Exhausted.to_string(), "exhausted");
    assert_eq!("upcoming".parse::<Phase>().unwrap(), Phase::Upcoming);
    assert_eq!(
      serde_json::to_string(&Phase::Expired).unwrap(),
      "\"expired\""
    );
  }

  #[test]
  fn remaining_never_underflows() {
    assert_eq!(voucher(1, 3).remaining(), 2);
    assert_eq!(voucher(4, 3).remaining(), 0);
  }

  #[test]
  fn validate_normalizes_code_and_conditions() {
    let v = new_voucher().validate().unwrap();
    assert_eq!(v.code, "SUMMER10");
    assert_eq!(v.conditions.as_deref(), Some("dine-in only"));

    let blank = NewVoucher { conditions: Some("   ".into()), ..new_voucher() }
      .validate()
      .unwrap();
    assert_eq!(blank.conditions, None);
  }

  #[test]
  fn validate_rejects_out_of_bounds_fields() {
    let short = NewVoucher { code: "ab".into(), ..new_voucher() };
    assert_eq!(short.validate().unwrap_err(), Error::CodeLength(2));

    let long = NewVoucher { code: "X".repeat(21), ..new_voucher() };
    assert_eq!(long.validate().unwrap_err(), Error::CodeLength(21));

    let free = NewVoucher { discount_percent: 0, ..new_voucher() };
    assert_eq!(free.validate().unwrap_err(), Error::DiscountOutOfRange(0));

    let over = NewVoucher { discount_percent: 101, ..new_voucher() };
    assert_eq!(over.validate().unwrap_err(), Error::DiscountOutOfRange(101));

    let none = NewVoucher { quantity_total: 0, ..new_voucher() };
    assert_eq!(none.validate().unwrap_err(), Error::ZeroQuantity);

    let wordy = NewVoucher { conditions: Some("x".repeat(301)), ..new_voucher() };
    assert_eq!(wordy.validate().unwrap_err(), Error::ConditionsTooLong(301));
  }

  #[test]
  fn validate_rejects_empty_window() {
    let from = at(1_000);
    let input = NewVoucher {
      valid_from: from,
      valid_until: from,
      ..new_voucher()
    };
    assert!(matches!(input.validate(), Err(Error::EmptyWindow { .. })));

    let update = VoucherUpdate {
      code:             "WINTER".into(),
      discount_percent: 20,
      valid_from:       from,
      valid_until:      from - Duration::seconds(1),
      conditions:       None,
    };
    assert!(matches!(update.validate(), Err(Error::EmptyWindow { .. })));
  }

  #[test]
  fn status_reports_snapshot_of_voucher() {
    let v = voucher(1, 3);
    let status = VoucherStatus::new(&v, at(1_500), true, Some("Cafe".into()));
    assert_eq!(status.phase, Phase::Active);
    assert_eq!(status.remaining, 2);
    assert!(status.already_claimed);
    assert_eq!(status.expires_at, v.valid_until);
    assert_eq!(status.venue_name.as_deref(), Some("Cafe"));
  }
}
