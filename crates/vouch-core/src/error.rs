//! Validation errors for `vouch-core` input types.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("voucher code must be 3-20 characters, got {0}")]
  CodeLength(usize),

  #[error("discount percent must be between 1 and 100, got {0}")]
  DiscountOutOfRange(u8),

  #[error("quantity total must be at least 1")]
  ZeroQuantity,

  #[error("validity window is empty: {from} is not before {until}")]
  EmptyWindow {
    from:  DateTime<Utc>,
    until: DateTime<Utc>,
  },

  #[error("conditions must be at most 300 characters, got {0}")]
  ConditionsTooLong(usize),

  #[error("venue name must be 1-100 characters, got {0}")]
  VenueNameLength(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
