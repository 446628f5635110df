//! Caller identity.
//!
//! Authentication happens in front of this service; the fronting layer
//! forwards the authenticated account as a UUID in [`ACCOUNT_HEADER`].

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACCOUNT_HEADER: &str = "x-account-id";

/// The account making the request. Rejects with 401 when the header is
/// absent or not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account(pub Uuid);

impl<S> FromRequestParts<S> for Account
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(ACCOUNT_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| Uuid::parse_str(v.trim()).ok())
      .map(Account)
      .ok_or(ApiError::Unauthenticated)
  }
}
