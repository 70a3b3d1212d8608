use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::constants;
use crate::error::Result;
use crate::settings::Settings;
use crate::track::TrackRecord;

/// Encode a free-text search term for the `q` parameter: spaces become `+`,
/// anything outside the unreserved set is percent-encoded.
pub fn encode_term(term: &str) -> String {
  let mut out = String::with_capacity(term.len());
  for byte in term.trim().bytes() {
    match byte {
      b' ' => out.push('+'),
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
      _ => out.push_str(&format!("%{:02X}", byte)),
    }
  }
  out
}

/// Append `client_id=<token>` to a URL, respecting an existing query string.
pub fn with_client_id(url: &str, client_id: &str) -> String {
  let sep = if url.contains('?') { '&' } else { '?' };
  format!("{}{}client_id={}", url, sep, client_id)
}

/// Client for the `tracks.json` search endpoint.
#[derive(Clone)]
pub struct SearchClient {
  http: Client,
  base: String,
  timeout: Duration,
}

impl SearchClient {
  pub fn new(http: Client, base: impl Into<String>, timeout: Duration) -> Self {
    Self { http, base: base.into().trim_end_matches('/').to_string(), timeout }
  }

  pub fn query_url(&self, term: &str, settings: &Settings, client_id: &str) -> String {
    format!(
      "{}/tracks.json?client_id={}&duration[from]={}&duration[to]={}&q={}&filter={}",
      self.base,
      client_id,
      settings.min_ms,
      settings.max_ms,
      encode_term(term),
      constants().search_filter,
    )
  }

  /// One GET, no retries. Non-2xx, timeouts and malformed bodies are errors.
  pub async fn search(&self, term: &str, settings: &Settings, client_id: &str) -> Result<Vec<TrackRecord>> {
    let url = self.query_url(term, settings, client_id);
    info!(term = %term, min_ms = settings.min_ms, max_ms = settings.max_ms, "search: querying");

    let response = self.http.get(&url).timeout(self.timeout).send().await?.error_for_status()?;
    let body = response.bytes().await?;
    debug!(bytes = body.len(), "search: response received");

    let tracks: Vec<TrackRecord> = serde_json::from_slice(&body)?;
    info!(results = tracks.len(), "search: done");
    Ok(tracks)
  }
}
