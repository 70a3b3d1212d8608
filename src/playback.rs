//! Stream-or-download decision and the lifecycle of one play request.
//!
//! A request moves `Deciding -> Streaming | Downloading -> Playing`.
//! Streaming hands the stream URL straight to the player. Downloading fetches
//! the track into the scratch file on a background task and starts the player
//! on that file as soon as enough bytes are buffered, before the download has
//! finished. The request itself completes only once the download reports back.

use reqwest::{Client, header::CONTENT_TYPE};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{Mutex, OwnedMutexGuard, oneshot, watch};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::player::{Player, PlayerSlot};
use crate::soundcloud::with_client_id;
use crate::track::TrackRecord;

// --- Types ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackDecision {
  Stream { url: String },
  Download { url: String },
}

impl PlaybackDecision {
  /// Download when the track allows it and has somewhere to download from,
  /// otherwise stream. Both URLs carry the client id.
  pub fn for_track(track: &TrackRecord, client_id: &str) -> Self {
    match track.download_url.as_deref() {
      Some(url) if track.downloadable && !url.is_empty() => Self::Download { url: with_client_id(url, client_id) },
      _ => Self::Stream { url: with_client_id(&track.stream_url, client_id) },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Deciding,
  Streaming,
  Downloading,
  Playing,
}

/// One play request.
pub struct PlaybackTask {
  pub track: TrackRecord,
  pub decision: PlaybackDecision,
  phase: Phase,
}

impl PlaybackTask {
  pub fn new(track: TrackRecord, client_id: &str) -> Self {
    debug!(title = %track.title, "play: deciding");
    let decision = PlaybackDecision::for_track(&track, client_id);
    Self { track, decision, phase: Phase::Deciding }
  }

  fn enter(&mut self, phase: Phase) {
    debug!(title = %self.track.title, from = ?self.phase, to = ?phase, "play: phase change");
    self.phase = phase;
  }
}

/// What the download task has written so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadProgress {
  pub bytes: u64,
  pub finished: bool,
  pub content_type: Option<String>,
}

/// Receiving side of a running download.
pub struct Download {
  pub progress: watch::Receiver<DownloadProgress>,
  done: oneshot::Receiver<Result<u64>>,
}

impl Download {
  /// Wait for the completion signal.
  pub async fn finish(&mut self) -> Result<u64> {
    (&mut self.done).await.map_err(|_| Error::Download("download task ended without reporting".to_string()))?
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackReport {
  Streamed { target: String },
  Downloaded { path: PathBuf, bytes: u64 },
}

/// When the player may start on a partially downloaded file.
#[derive(Debug, Clone, Copy)]
pub struct Readiness {
  pub min_bytes: u64,
  /// Start the player anyway once this has passed.
  pub timeout: Duration,
}

// --- Orchestrator ---

pub struct Orchestrator {
  http: Client,
  client_id: String,
  player: Player,
  slot: PlayerSlot,
  scratch: Arc<Mutex<PathBuf>>,
  readiness: Readiness,
}

impl Orchestrator {
  pub fn new(http: Client, client_id: String, player: Player, scratch: PathBuf, readiness: Readiness) -> Self {
    Self { http, client_id, player, slot: PlayerSlot::default(), scratch: Arc::new(Mutex::new(scratch)), readiness }
  }

  pub fn slot(&self) -> &PlayerSlot {
    &self.slot
  }

  pub async fn play(&self, track: TrackRecord) -> Result<PlaybackReport> {
    let mut task = PlaybackTask::new(track, &self.client_id);
    self.announce(&task);

    match task.decision.clone() {
      PlaybackDecision::Stream { url } => {
        task.enter(Phase::Streaming);
        println!("Not downloadable, streaming ...");
        self.start_player(&mut task, &url).await?;
        Ok(PlaybackReport::Streamed { target: url })
      }
      PlaybackDecision::Download { url } => {
        task.enter(Phase::Downloading);
        let scratch = Arc::clone(&self.scratch).lock_owned().await;
        let path = scratch.clone();
        let mut download = spawn_download(self.http.clone(), url, scratch);

        let ready = self.wait_until_buffered(&mut download.progress).await;
        // Nothing to play if the download already ended, successfully or not.
        let early = if ready.finished { Some(download.finish().await?) } else { None };

        let kind = match probe_content_type(&path).await.or(ready.content_type) {
          Some(kind) => kind,
          None => "unknown".to_string(),
        };
        println!("Downloading and playing from local file: {}", kind);

        self.start_player(&mut task, &path.to_string_lossy()).await?;

        let bytes = match early {
          Some(bytes) => bytes,
          None => download.finish().await?,
        };
        println!("Download finished ({} bytes)", bytes);
        Ok(PlaybackReport::Downloaded { path, bytes })
      }
    }
  }

  fn announce(&self, task: &PlaybackTask) {
    let track = &task.track;
    info!(title = %track.title, decision = ?task.decision, "play: requested");
    println!("Playing {} ...", track.title);
    println!("Link: \n{}", track.permalink_url);
    println!("Stream: \n{}", with_client_id(&track.stream_url, &self.client_id));
    if let Some(url) = track.download_url.as_deref().filter(|u| !u.is_empty()) {
      println!("Download: \n{}", with_client_id(url, &self.client_id));
    }
  }

  async fn start_player(&self, task: &mut PlaybackTask, target: &str) -> Result<()> {
    let child = self.player.launch(target)?;
    self.slot.replace(child, target).await;
    task.enter(Phase::Playing);
    Ok(())
  }

  async fn wait_until_buffered(&self, progress: &mut watch::Receiver<DownloadProgress>) -> DownloadProgress {
    let min_bytes = self.readiness.min_bytes;
    let waited = tokio::time::timeout(
      self.readiness.timeout,
      progress.wait_for(|p| p.finished || p.bytes >= min_bytes),
    )
    .await
    .map(|r| r.map(|p| DownloadProgress::clone(&p)));

    match waited {
      Ok(Ok(p)) => p,
      Ok(Err(_)) => progress.borrow().clone(),
      Err(_) => {
        let p = progress.borrow().clone();
        if p.bytes > 0 || p.finished {
          warn!(bytes = p.bytes, min_bytes, "download: buffer not filled in time, starting player anyway");
          return p;
        }
        // An empty scratch file has nothing to play yet.
        warn!(min_bytes, "download: no data in time, waiting for the first chunk");
        let first = progress.wait_for(|p| p.finished || p.bytes > 0).await.map(|p| DownloadProgress::clone(&p));
        first.unwrap_or_else(|_| progress.borrow().clone())
      }
    }
  }
}

// --- Download ---

/// Fetch `url` into the scratch file on a background task. The task holds the
/// scratch lock until the body is fully written.
fn spawn_download(http: Client, url: String, scratch: OwnedMutexGuard<PathBuf>) -> Download {
  let (progress_tx, progress_rx) = watch::channel(DownloadProgress::default());
  let (done_tx, done_rx) = oneshot::channel();

  tokio::spawn(async move {
    let result = download_to(&http, &url, &scratch, &progress_tx).await;
    match &result {
      Ok(bytes) => info!(bytes, path = %scratch.display(), "download: finished"),
      Err(e) => warn!(err = %e, "download: failed"),
    }
    drop(scratch);
    progress_tx.send_modify(|p| p.finished = true);
    let _ = done_tx.send(result);
  });

  Download { progress: progress_rx, done: done_rx }
}

async fn download_to(
  http: &Client,
  url: &str,
  path: &Path,
  progress: &watch::Sender<DownloadProgress>,
) -> Result<u64> {
  use futures::StreamExt;

  // Truncate before the request: the player may open this path before the response arrives.
  let mut file = tokio::fs::File::create(path).await?;

  let response = http.get(url).send().await?.error_for_status()?;
  let content_type = response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string);
  progress.send_modify(|p| p.content_type = content_type);

  let mut stream = response.bytes_stream();
  let mut written: u64 = 0;

  while let Some(chunk) = stream.next().await {
    let chunk = chunk?;
    file.write_all(&chunk).await?;
    file.flush().await?;
    written += chunk.len() as u64;
    progress.send_modify(|p| p.bytes = written);
  }

  Ok(written)
}

/// Best effort `file -b <path>`.
async fn probe_content_type(path: &Path) -> Option<String> {
  let output = Command::new("file")
    .arg("-b")
    .arg(path)
    .stdin(Stdio::null())
    .stderr(Stdio::null())
    .output()
    .await
    .ok()?;
  if !output.status.success() {
    return None;
  }
  let kind = String::from_utf8_lossy(&output.stdout).trim().to_string();
  (!kind.is_empty()).then_some(kind)
}
