//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub api_base: String,
  pub search_filter: String,
  pub client_id_file: String,

  // Duration filter defaults (minutes)
  pub default_min_minutes: i64,
  pub default_max_minutes: i64,

  // HTTP
  pub search_timeout_secs: u64,
  pub connect_timeout_secs: u64,

  // Download-then-play
  pub scratch_file: String,
  pub min_buffered_bytes: u64,
  pub readiness_timeout_ms: u64,

  // External player
  pub player_program: String,
  pub player_args: Vec<String>,

  pub bucket_minutes: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed every test in this module fails.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
