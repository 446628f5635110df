//! Handlers for `/vouchers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/vouchers` | Claimable right now; optional `limit`, `offset` |
//! | `POST`   | `/vouchers` | Body: [`NewVoucherBody`]; venue owner only; returns 201 |
//! | `GET`    | `/vouchers/mine` | Every voucher at the caller's venues |
//! | `GET`    | `/vouchers/{id}` | Single voucher |
//! | `PUT`    | `/vouchers/{id}` | Body: [`VoucherUpdateBody`]; venue owner only |
//! | `DELETE` | `/vouchers/{id}` | Venue owner only; returns 204 |
//! | `GET`    | `/vouchers/{id}/status` | Status as seen by the caller |
//! | `POST`   | `/vouchers/{id}/claim` | Claim one unit; returns 201 + the claim record |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use vouch_core::{
  Ledger,
  store::LedgerStore,
  voucher::{NewVoucher, Voucher, VoucherStatus, VoucherUpdate},
};

use crate::{account::Account, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /vouchers[?limit=..][&offset=..]`
pub async fn list<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Voucher>>, ApiError> {
  let vouchers = ledger.claimable_vouchers(params.limit, params.offset).await?;
  Ok(Json(vouchers))
}

/// `GET /vouchers/mine`
pub async fn mine<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(owner_id): Account,
) -> Result<Json<Vec<Voucher>>, ApiError> {
  Ok(Json(ledger.owner_vouchers(owner_id).await?))
}

// ─── Single voucher ───────────────────────────────────────────────────────────

/// `GET /vouchers/{id}`
pub async fn get_one<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Voucher>, ApiError> {
  Ok(Json(ledger.get_voucher(id).await?))
}

// ─── Create / update / delete ─────────────────────────────────────────────────

/// JSON body accepted by `POST /vouchers`.
#[derive(Debug, Deserialize)]
pub struct NewVoucherBody {
  pub venue_id:         Uuid,
  pub code:             String,
  pub discount_percent: u8,
  pub quantity_total:   u32,
  pub valid_from:       DateTime<Utc>,
  pub valid_until:      DateTime<Utc>,
  pub conditions:       Option<String>,
}

impl From<NewVoucherBody> for NewVoucher {
  fn from(b: NewVoucherBody) -> Self {
    NewVoucher {
      code:             b.code,
      discount_percent: b.discount_percent,
      quantity_total:   b.quantity_total,
      valid_from:       b.valid_from,
      valid_until:      b.valid_until,
      venue_id:         b.venue_id,
      conditions:       b.conditions,
    }
  }
}

/// `POST /vouchers`
pub async fn create<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(owner_id): Account,
  Json(body): Json<NewVoucherBody>,
) -> Result<impl IntoResponse, ApiError> {
  let voucher = ledger.create_voucher(owner_id, body.into()).await?;
  Ok((StatusCode::CREATED, Json(voucher)))
}

/// JSON body accepted by `PUT /vouchers/{id}`. Every editable field is
/// replaced.
#[derive(Debug, Deserialize)]
pub struct VoucherUpdateBody {
  pub code:             String,
  pub discount_percent: u8,
  pub valid_from:       DateTime<Utc>,
  pub valid_until:      DateTime<Utc>,
  pub conditions:       Option<String>,
}

impl From<VoucherUpdateBody> for VoucherUpdate {
  fn from(b: VoucherUpdateBody) -> Self {
    VoucherUpdate {
      code:             b.code,
      discount_percent: b.discount_percent,
      valid_from:       b.valid_from,
      valid_until:      b.valid_until,
      conditions:       b.conditions,
    }
  }
}

/// `PUT /vouchers/{id}`
pub async fn update<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(owner_id): Account,
  Path(id): Path<Uuid>,
  Json(body): Json<VoucherUpdateBody>,
) -> Result<Json<Voucher>, ApiError> {
  Ok(Json(ledger.update_voucher(owner_id, id, body.into()).await?))
}

/// `DELETE /vouchers/{id}`
pub async fn delete_one<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(owner_id): Account,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  ledger.delete_voucher(owner_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Claim protocol ───────────────────────────────────────────────────────────

/// `GET /vouchers/{id}/status`
pub async fn status<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(account_id): Account,
  Path(id): Path<Uuid>,
) -> Result<Json<VoucherStatus>, ApiError> {
  Ok(Json(ledger.status(id, account_id).await?))
}

/// `POST /vouchers/{id}/claim`
pub async fn claim<S: LedgerStore>(
  State(ledger): State<Ledger<S>>,
  Account(account_id): Account,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let record = ledger.claim(id, account_id).await?;
  Ok((StatusCode::CREATED, Json(record)))
}
