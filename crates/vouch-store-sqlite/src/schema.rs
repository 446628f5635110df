//! SQL schema for the Vouch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS venues (
    venue_id    TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- quantity_claimed is only ever changed by the claim transaction.
CREATE TABLE IF NOT EXISTS vouchers (
    voucher_id        TEXT PRIMARY KEY,
    code              TEXT NOT NULL UNIQUE,   -- upper-case
    discount_percent  INTEGER NOT NULL CHECK (discount_percent BETWEEN 1 AND 100),
    quantity_total    INTEGER NOT NULL CHECK (quantity_total >= 1),
    quantity_claimed  INTEGER NOT NULL DEFAULT 0
                      CHECK (quantity_claimed BETWEEN 0 AND quantity_total),
    valid_from        TEXT NOT NULL,          -- fixed-width RFC 3339 UTC
    valid_until       TEXT NOT NULL,
    venue_id          TEXT NOT NULL REFERENCES venues(venue_id),
    conditions        TEXT,
    created_at        TEXT NOT NULL,
    CHECK (valid_from < valid_until)
);

-- Claim records are snapshots and carry no foreign key to vouchers, so they
-- outlive voucher deletion. Rows are never deleted; the sweep sets swept_at.
CREATE TABLE IF NOT EXISTS claims (
    claim_id                   TEXT PRIMARY KEY,
    account_id                 TEXT NOT NULL,
    voucher_id                 TEXT NOT NULL,
    claimed_at                 TEXT NOT NULL,
    expires_at                 TEXT NOT NULL,
    snapshot_code              TEXT NOT NULL,
    snapshot_discount_percent  INTEGER NOT NULL,
    snapshot_venue_name        TEXT,
    swept_at                   TEXT
);

-- At most one unswept record per (account, voucher) pair.
CREATE UNIQUE INDEX IF NOT EXISTS claims_open_pair_idx
    ON claims(account_id, voucher_id) WHERE swept_at IS NULL;
CREATE INDEX IF NOT EXISTS claims_account_idx  ON claims(account_id);
CREATE INDEX IF NOT EXISTS claims_voucher_idx  ON claims(voucher_id);
CREATE INDEX IF NOT EXISTS vouchers_venue_idx  ON vouchers(venue_id);
CREATE INDEX IF NOT EXISTS vouchers_window_idx ON vouchers(valid_from, valid_until);
CREATE INDEX IF NOT EXISTS venues_owner_idx    ON venues(owner_id);

PRAGMA user_version = 1;
";
