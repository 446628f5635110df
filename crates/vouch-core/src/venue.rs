//! Venues, the places vouchers are redeemed at.
//!
//! The ledger only needs two things from a venue: its display name, which is
//! snapshotted into every claim, and its owner, who alone may manage the
//! venue's vouchers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const VENUE_NAME_MAX_LEN: usize = 100;

/// A registered venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
  pub venue_id:   Uuid,
  /// The account that registered the venue.
  pub owner_id:   Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::LedgerStore::add_venue`].
#[derive(Debug, Clone)]
pub struct NewVenue {
  pub owner_id: Uuid,
  pub name:     String,
}

impl NewVenue {
  /// Trim the name and check its length.
  pub fn validate(self) -> Result<Self> {
    let name = self.name.trim().to_owned();
    let len = name.chars().count();
    if len == 0 || len > VENUE_NAME_MAX_LEN {
      return Err(Error::VenueNameLength(len));
    }
    Ok(Self { name, ..self })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_is_trimmed() {
    let v = NewVenue { owner_id: Uuid::nil(), name: "  Cafe Mimi ".into() }
      .validate()
      .unwrap();
    assert_eq!(v.name, "Cafe Mimi");
  }

  #[test]
  fn blank_name_rejected() {
    let err = NewVenue { owner_id: Uuid::nil(), name: "   ".into() }
      .validate()
      .unwrap_err();
    assert_eq!(err, Error::VenueNameLength(0));
  }
}
