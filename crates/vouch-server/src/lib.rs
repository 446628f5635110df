//! HTTP server assembly for Vouch.
//!
//! Loads [`ServerConfig`], and wraps the JSON API from [`vouch_api`] with a
//! health check and request tracing.

use std::path::{Path, PathBuf};

use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use vouch_core::{Ledger, store::LedgerStore};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `vouch.toml` and
/// `VOUCH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// Attempts per claim before a storage conflict is reported to the caller.
  #[serde(default = "default_claim_attempts")]
  pub claim_attempts: u32,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/vouch/vouch.db") }

fn default_claim_attempts() -> u32 { 3 }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `VOUCH_*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("VOUCH"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level router: `/healthz` plus the API under `/api`.
pub fn router<S>(ledger: Ledger<S>) -> Router
where
  S: LedgerStore + 'static,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", vouch_api::api_router(ledger))
    .layer(TraceLayer::new_for_http())
}
