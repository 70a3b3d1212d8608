//! In-process stand-ins for the search API and the download host.

use axum::{
  Router,
  body::Body,
  extract::{RawQuery, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
  routing::get,
};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::PlayerConfig;

#[derive(Default)]
struct Shared {
  search: Mutex<(u16, String)>,
  last_query: Mutex<Option<String>>,
  download: Mutex<(u16, Vec<Vec<u8>>, Duration)>,
  header_delay: Mutex<Duration>,
  last_download_query: Mutex<Option<String>>,
  download_events: Mutex<Vec<String>>,
}

pub struct TestServer {
  addr: SocketAddr,
  shared: Arc<Shared>,
}

impl TestServer {
  pub async fn start() -> Self {
    let shared = Arc::new(Shared::default());
    *shared.search.lock().unwrap() = (200, "[]".to_string());
    *shared.download.lock().unwrap() = (200, Vec::new(), Duration::ZERO);

    let app = Router::new()
      .route("/tracks.json", get(search))
      .route("/download", get(download))
      .with_state(Arc::clone(&shared));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    Self { addr, shared }
  }

  pub fn with_search(self, status: u16, body: String) -> Self {
    *self.shared.search.lock().unwrap() = (status, body);
    self
  }

  /// Serve `chunks` from `/download`, pausing `delay` between them.
  ///
  /// A `track=<name>` query parameter prepends a `<name>:` chunk, so
  /// concurrent downloads produce distinguishable bodies.
  pub fn with_download(self, status: u16, chunks: Vec<Vec<u8>>, delay: Duration) -> Self {
    *self.shared.download.lock().unwrap() = (status, chunks, delay);
    self
  }

  /// Hold back `/download` response headers for `delay`.
  pub fn with_header_delay(self, delay: Duration) -> Self {
    *self.shared.header_delay.lock().unwrap() = delay;
    self
  }

  pub fn base(&self) -> String {
    format!("http://{}", self.addr)
  }

  pub fn download_url(&self) -> String {
    format!("{}/download", self.base())
  }

  pub fn last_query(&self) -> Option<String> {
    self.shared.last_query.lock().unwrap().clone()
  }

  pub fn last_download_query(&self) -> Option<String> {
    self.shared.last_download_query.lock().unwrap().clone()
  }

  /// `begin <track>` when a download request arrives, `end <track>` once its
  /// last chunk has been handed out.
  pub fn download_events(&self) -> Vec<String> {
    self.shared.download_events.lock().unwrap().clone()
  }
}

async fn search(State(shared): State<Arc<Shared>>, RawQuery(query): RawQuery) -> Response {
  *shared.last_query.lock().unwrap() = query;
  let (status, body) = shared.search.lock().unwrap().clone();
  (StatusCode::from_u16(status).unwrap(), [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn download(State(shared): State<Arc<Shared>>, RawQuery(query): RawQuery) -> Response {
  let name = query
    .as_deref()
    .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("track=")))
    .map(str::to_string);
  let label = name.clone().unwrap_or_else(|| "-".to_string());
  shared.download_events.lock().unwrap().push(format!("begin {}", label));
  *shared.last_download_query.lock().unwrap() = query;

  let header_delay = *shared.header_delay.lock().unwrap();
  tokio::time::sleep(header_delay).await;

  let (status, mut chunks, delay) = shared.download.lock().unwrap().clone();
  if let Some(name) = name {
    chunks.insert(0, format!("{}:", name).into_bytes());
  }
  let last = chunks.len().saturating_sub(1);
  let events = Arc::clone(&shared);
  let stream = futures::stream::iter(chunks.into_iter().enumerate()).then(move |(i, chunk)| {
    let events = Arc::clone(&events);
    let label = label.clone();
    async move {
      if i > 0 {
        tokio::time::sleep(delay).await;
      }
      if i == last {
        events.download_events.lock().unwrap().push(format!("end {}", label));
      }
      Ok::<_, std::io::Error>(chunk)
    }
  });
  (StatusCode::from_u16(status).unwrap(), [(header::CONTENT_TYPE, "audio/mpeg")], Body::from_stream(stream))
    .into_response()
}

pub fn track_json(title: &str, created_at: &str, downloadable: bool) -> String {
  serde_json::json!({
    "title": title,
    "duration": 1_800_000,
    "stream_url": format!("https://api.example/tracks/{}/stream", title),
    "download_url": null,
    "permalink_url": format!("https://example.com/{}", title),
    "description": "",
    "created_at": created_at,
    "downloadable": downloadable,
    "user": { "id": 1, "username": "someone" }
  })
  .to_string()
}

/// A "player" that idles until killed. The target lands in `$0`.
pub fn sleeping_player() -> PlayerConfig {
  PlayerConfig { program: "sh".to_string(), args: vec!["-c".to_string(), "exec sleep 30".to_string()] }
}

/// Like [`sleeping_player`], but first copies whatever its target file holds into `out`.
pub fn copying_player(out: &std::path::Path) -> PlayerConfig {
  let script = format!("cat \"$0\" > '{}'; exec sleep 30", out.display());
  PlayerConfig { program: "sh".to_string(), args: vec!["-c".to_string(), script] }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
  F: FnMut() -> Fut,
  Fut: std::future::Future<Output = bool>,
{
  let deadline = tokio::time::Instant::now() + timeout;
  while tokio::time::Instant::now() < deadline {
    if check().await {
      return true;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
  }
  check().await
}
