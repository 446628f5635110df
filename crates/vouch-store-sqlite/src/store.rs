//! [`SqliteStore`]: the SQLite implementation of [`LedgerStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use vouch_core::{
  claim::{ClaimAttempt, ClaimRecord, ClaimRejection},
  store::{LedgerStore, VoucherQuery, VoucherWrite},
  venue::{NewVenue, Venue},
  voucher::{NewVoucher, Phase, Voucher, VoucherUpdate},
};

use crate::{
  encode::{
    encode_dt, encode_uuid, RawClaim, RawVenue, RawVoucher, CLAIM_COLUMNS,
    VOUCHER_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

/// How long a writer waits for another connection's lock before giving up
/// with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A voucher ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Several
/// stores (or processes) may open the same file; claim transactions take the
/// database write lock up front, so they serialise across all of them.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Transactions ────────────────────────────────────────────────────────────
//
// These run on the connection thread and return the crate error so that
// decoding failures and constraint violations can be told apart afterwards.

/// One claim attempt. Every early return drops `tx` and rolls back.
fn claim_in_transaction(
  conn:       &mut rusqlite::Connection,
  claim_id:   Uuid,
  voucher_id: Uuid,
  account_id: Uuid,
  now:        DateTime<Utc>,
) -> Result<ClaimAttempt> {
  let voucher_str = encode_uuid(voucher_id);
  let account_str = encode_uuid(account_id);
  let now_str     = encode_dt(now);

  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let found = tx
    .query_row(
      &format!(
        "SELECT {VOUCHER_COLUMNS}, n.name
         FROM vouchers v
         LEFT JOIN venues n ON n.venue_id = v.venue_id
         WHERE v.voucher_id = ?1"
      ),
      rusqlite::params![voucher_str],
      |row| Ok((RawVoucher::from_row(row)?, row.get::<_, Option<String>>(10)?)),
    )
    .optional()?;

  let Some((raw, venue_name)) = found else {
    return Ok(ClaimAttempt::Rejected(ClaimRejection::NotFound));
  };
  let voucher = raw.into_voucher()?;

  // A sold-out voucher falls through: a holder of a live claim must still see
  // `AlreadyClaimed`, and the conditional increment below reports `Exhausted`.
  if let phase @ (Phase::Upcoming | Phase::Expired) = voucher.phase_at(now) {
    return Ok(ClaimAttempt::Rejected(ClaimRejection::NotClaimable(phase)));
  }

  // An expired record for this pair must not block a fresh claim.
  tx.execute(
    "UPDATE claims SET swept_at = ?3
     WHERE account_id = ?1 AND voucher_id = ?2
       AND swept_at IS NULL AND expires_at < ?3",
    rusqlite::params![account_str, voucher_str, now_str],
  )?;

  let held = tx
    .query_row(
      "SELECT 1 FROM claims
       WHERE account_id = ?1 AND voucher_id = ?2 AND swept_at IS NULL",
      rusqlite::params![account_str, voucher_str],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if held {
    return Ok(ClaimAttempt::Rejected(ClaimRejection::AlreadyClaimed));
  }

  let bumped = tx.execute(
    "UPDATE vouchers SET quantity_claimed = quantity_claimed + 1
     WHERE voucher_id = ?1 AND quantity_claimed < quantity_total",
    rusqlite::params![voucher_str],
  )?;
  if bumped == 0 {
    return Ok(ClaimAttempt::Rejected(ClaimRejection::Exhausted));
  }

  let record = ClaimRecord {
    claim_id,
    account_id,
    voucher_id,
    claimed_at:                now,
    expires_at:                voucher.valid_until,
    snapshot_code:             voucher.code,
    snapshot_discount_percent: voucher.discount_percent,
    snapshot_venue_name:       venue_name,
  };

  tx.execute(
    &format!(
      "INSERT INTO claims ({CLAIM_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    ),
    rusqlite::params![
      encode_uuid(claim_id),
      account_str,
      voucher_str,
      now_str,
      encode_dt(record.expires_at),
      &record.snapshot_code,
      record.snapshot_discount_percent,
      &record.snapshot_venue_name,
    ],
  )?;

  tx.commit()?;
  Ok(ClaimAttempt::Claimed(record))
}

fn update_in_transaction(
  conn:       &mut rusqlite::Connection,
  voucher_id: Uuid,
  update:     &VoucherUpdate,
) -> Result<VoucherWrite> {
  let id_str = encode_uuid(voucher_id);
  let tx = conn.transaction()?;

  let changed = tx.execute(
    "UPDATE vouchers
     SET code = ?2, discount_percent = ?3, valid_from = ?4,
         valid_until = ?5, conditions = ?6
     WHERE voucher_id = ?1",
    rusqlite::params![
      id_str,
      update.code,
      update.discount_percent,
      encode_dt(update.valid_from),
      encode_dt(update.valid_until),
      update.conditions,
    ],
  );
  match changed.map_err(Error::from) {
    Ok(0) => return Ok(VoucherWrite::Missing),
    Ok(_) => {}
    Err(e) if e.is_unique_violation() => return Ok(VoucherWrite::CodeTaken),
    Err(e) => return Err(e),
  }

  let raw = tx.query_row(
    &format!("SELECT {VOUCHER_COLUMNS} FROM vouchers v WHERE v.voucher_id = ?1"),
    rusqlite::params![id_str],
    RawVoucher::from_row,
  )?;
  tx.commit()?;

  Ok(VoucherWrite::Written(raw.into_voucher()?))
}

fn sweep_in_transaction(
  conn:       &mut rusqlite::Connection,
  account_id: Uuid,
  now:        DateTime<Utc>,
) -> Result<(usize, Vec<RawClaim>)> {
  let account_str = encode_uuid(account_id);
  let now_str     = encode_dt(now);

  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let swept = tx.execute(
    "UPDATE claims SET swept_at = ?2
     WHERE account_id = ?1 AND swept_at IS NULL AND expires_at < ?2",
    rusqlite::params![account_str, now_str],
  )?;

  let live = {
    let mut stmt = tx.prepare(&format!(
      "SELECT {CLAIM_COLUMNS} FROM claims
       WHERE account_id = ?1 AND swept_at IS NULL
       ORDER BY claimed_at, claim_id"
    ))?;
    stmt
      .query_map(rusqlite::params![account_str], RawClaim::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  tx.commit()?;
  Ok((swept, live))
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  // ── Venues ────────────────────────────────────────────────────────────────

  async fn add_venue(&self, input: NewVenue) -> Result<Venue> {
    let venue = Venue {
      venue_id:   Uuid::new_v4(),
      owner_id:   input.owner_id,
      name:       input.name,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(venue.venue_id);
    let owner_str = encode_uuid(venue.owner_id);
    let name      = venue.name.clone();
    let at_str    = encode_dt(venue.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO venues (venue_id, owner_id, name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, owner_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(venue)
  }

  async fn get_venue(&self, id: Uuid) -> Result<Option<Venue>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVenue> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT venue_id, owner_id, name, created_at
               FROM venues WHERE venue_id = ?1",
              rusqlite::params![id_str],
              RawVenue::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVenue::into_venue).transpose()
  }

  // ── Vouchers ──────────────────────────────────────────────────────────────

  async fn create_voucher(&self, input: NewVoucher) -> Result<VoucherWrite> {
    let voucher = Voucher {
      voucher_id:       Uuid::new_v4(),
      code:             input.code,
      discount_percent: input.discount_percent,
      quantity_total:   input.quantity_total,
      quantity_claimed: 0,
      valid_from:       input.valid_from,
      valid_until:      input.valid_until,
      venue_id:         input.venue_id,
      conditions:       input.conditions,
      created_at:       Utc::now(),
    };

    let id_str      = encode_uuid(voucher.voucher_id);
    let code        = voucher.code.clone();
    let discount    = voucher.discount_percent;
    let total       = voucher.quantity_total;
    let from_str    = encode_dt(voucher.valid_from);
    let until_str   = encode_dt(voucher.valid_until);
    let venue_str   = encode_uuid(voucher.venue_id);
    let conditions  = voucher.conditions.clone();
    let created_str = encode_dt(voucher.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .execute(
              "INSERT INTO vouchers (
                 voucher_id, code, discount_percent, quantity_total,
                 quantity_claimed, valid_from, valid_until, venue_id,
                 conditions, created_at
               ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9)",
              rusqlite::params![
                id_str,
                code,
                discount,
                total,
                from_str,
                until_str,
                venue_str,
                conditions,
                created_str,
              ],
            )
            .map_err(Error::from),
        )
      })
      .await?;

    match inserted {
      Ok(_) => Ok(VoucherWrite::Written(voucher)),
      Err(e) if e.is_unique_violation() => Ok(VoucherWrite::CodeTaken),
      Err(e) if e.is_foreign_key_violation() => Ok(VoucherWrite::Missing),
      Err(e) => Err(e),
    }
  }

  async fn get_voucher(&self, id: Uuid) -> Result<Option<Voucher>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVoucher> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VOUCHER_COLUMNS} FROM vouchers v WHERE v.voucher_id = ?1"),
              rusqlite::params![id_str],
              RawVoucher::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVoucher::into_voucher).transpose()
  }

  async fn update_voucher(&self, id: Uuid, update: VoucherUpdate) -> Result<VoucherWrite> {
    self
      .conn
      .call(move |conn| Ok(update_in_transaction(conn, id, &update)))
      .await?
  }

  async fn delete_voucher(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM vouchers WHERE voucher_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn list_vouchers(&self, query: &VoucherQuery) -> Result<Vec<Voucher>> {
    let venue_str     = query.venue_id.map(encode_uuid);
    let owner_str     = query.owner_id.map(encode_uuid);
    let claimable_str = query.claimable_at.map(encode_dt);
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val     = query
      .limit
      .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset_val    = i64::try_from(query.offset.unwrap_or(0)).unwrap_or(i64::MAX);

    let raws: Vec<RawVoucher> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VOUCHER_COLUMNS}
           FROM vouchers v
           JOIN venues n ON n.venue_id = v.venue_id
           WHERE (?1 IS NULL OR v.venue_id = ?1)
             AND (?2 IS NULL OR n.owner_id = ?2)
             AND (?3 IS NULL OR (
                   v.valid_from <= ?3 AND v.valid_until >= ?3
                   AND v.quantity_claimed < v.quantity_total))
           ORDER BY v.created_at DESC, v.voucher_id
           LIMIT ?4 OFFSET ?5"
        ))?;

        let rows = stmt
          .query_map(
            rusqlite::params![venue_str, owner_str, claimable_str, limit_val, offset_val],
            RawVoucher::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVoucher::into_voucher).collect()
  }

  // ── Claims ────────────────────────────────────────────────────────────────

  async fn live_claim(
    &self,
    account_id: Uuid,
    voucher_id: Uuid,
    now:        DateTime<Utc>,
  ) -> Result<Option<ClaimRecord>> {
    let account_str = encode_uuid(account_id);
    let voucher_str = encode_uuid(voucher_id);
    let now_str     = encode_dt(now);

    let raw: Option<RawClaim> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CLAIM_COLUMNS} FROM claims
                 WHERE account_id = ?1 AND voucher_id = ?2
                   AND swept_at IS NULL AND expires_at >= ?3"
              ),
              rusqlite::params![account_str, voucher_str, now_str],
              RawClaim::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawClaim::into_claim).transpose()
  }

  async fn try_claim(
    &self,
    voucher_id: Uuid,
    account_id: Uuid,
    now:        DateTime<Utc>,
  ) -> Result<ClaimAttempt> {
    let claim_id = Uuid::new_v4();

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(claim_in_transaction(conn, claim_id, voucher_id, account_id, now))
      })
      .await?;

    match outcome {
      Err(e) if e.is_contention() => {
        tracing::debug!(%voucher_id, %account_id, error = %e, "claim transaction hit a locked database");
        Ok(ClaimAttempt::Conflict)
      }
      // Backstop for the open-pair index; the transaction checks first.
      Err(e) if e.is_unique_violation() => {
        Ok(ClaimAttempt::Rejected(ClaimRejection::AlreadyClaimed))
      }
      other => other,
    }
  }

  async fn sweep_claims(
    &self,
    account_id: Uuid,
    now:        DateTime<Utc>,
  ) -> Result<Vec<ClaimRecord>> {
    let (swept, raws) = self
      .conn
      .call(move |conn| Ok(sweep_in_transaction(conn, account_id, now)))
      .await??;

    if swept > 0 {
      tracing::debug!(%account_id, swept, "retired expired claim records");
    }

    raws.into_iter().map(RawClaim::into_claim).collect()
  }
}
