//! Errors the command loop reports and recovers from.
//!
//! Startup plumbing uses `anyhow`; everything that can go wrong while the
//! session is running is classified here so the dispatcher can print a short
//! message and keep reading input.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  /// `i <index>` or `<index>` pointed past the current result set.
  #[error("No result #{index} (the last search returned {len} tracks)")]
  IndexOutOfRange { index: usize, len: usize },

  /// Any failure of the search request, with its cause.
  #[error("Search failed: {0}")]
  Search(#[source] Box<Error>),

  #[error("Usage: {0}")]
  Usage(String),

  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Unexpected response body: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Failed to start player '{program}': {source}")]
  PlayerLaunch {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Download failed: {0}")]
  Download(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
