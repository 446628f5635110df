//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error is rendered as `{"error": <message>, "code": <kind>}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use vouch_core::LedgerError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or malformed X-Account-Id header")]
  Unauthenticated,

  #[error(transparent)]
  Ledger(#[from] LedgerError),
}

impl ApiError {
  /// HTTP status and machine-readable kind for this error.
  pub fn classify(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
      ApiError::Ledger(e) => match e {
        LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        LedgerError::VenueNotFound(_) => (StatusCode::NOT_FOUND, "venue_not_found"),
        LedgerError::NotClaimable { .. } => (StatusCode::CONFLICT, "not_claimable"),
        LedgerError::AlreadyClaimed { .. } => (StatusCode::CONFLICT, "already_claimed"),
        LedgerError::Exhausted(_) => (StatusCode::CONFLICT, "exhausted"),
        LedgerError::DuplicateCode(_) => (StatusCode::CONFLICT, "duplicate_code"),
        LedgerError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
        LedgerError::Invalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid"),
        LedgerError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = self.classify();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string(), "code": code }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;
  use vouch_core::voucher::Phase;

  use super::*;

  #[test]
  fn claim_rejections_are_conflicts() {
    let id = Uuid::new_v4();
    let cases = [
      (LedgerError::NotClaimable { voucher_id: id, phase: Phase::Expired }, "not_claimable"),
      (LedgerError::AlreadyClaimed { voucher_id: id, account_id: id }, "already_claimed"),
      (LedgerError::Exhausted(id), "exhausted"),
    ];
    for (err, kind) in cases {
      assert_eq!(ApiError::from(err).classify(), (StatusCode::CONFLICT, kind));
    }
  }

  #[test]
  fn validation_errors_are_unprocessable() {
    let err = ApiError::from(LedgerError::from(vouch_core::Error::ZeroQuantity));
    assert_eq!(err.classify().0, StatusCode::UNPROCESSABLE_ENTITY);
  }
}
