//! Handlers for `/venues` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/venues` | Body: `{"name":"..."}`; the caller becomes the owner; returns 201 |
//! | `GET`  | `/venues/{id}` | Single venue |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vouch_core::{Ledger, store::LedgerStore, venue::Venue};

use crate::{account::Account, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct NewVenueBody {
  pub name: String,
}

/// `POST /venues`
pub async fn create<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(owner_id): Account,
  Json(body): Json<NewVenueBody>,
) -> Result<impl IntoResponse, ApiError> {
  let venue = ledger.register_venue(owner_id, body.name).await?;
  Ok((StatusCode::CREATED, Json(venue)))
}

/// `GET /venues/{id}`
pub async fn get_one<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Venue>, ApiError> {
  Ok(Json(ledger.get_venue(id).await?))
}
