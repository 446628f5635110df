//! Handler for `GET /claims`: the caller's live claims, oldest first.
//! Expired records are swept before the list is built.

use axum::{Json, extract::State};
use vouch_core::{Ledger, claim::ClaimRecord, store::LedgerStore};

use crate::{account::Account, error::ApiError};

/// `GET /claims`
pub async fn list<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(account_id): Account,
) -> Result<Json<Vec<ClaimRecord>>, ApiError> {
  Ok(Json(ledger.list_active_claims(account_id).await?))
}
