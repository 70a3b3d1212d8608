use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::playback::{Orchestrator, PlaybackReport};
use crate::rank::rank;
use crate::render::{Palette, render};
use crate::settings::Settings;
use crate::soundcloud::SearchClient;
use crate::track::TrackRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Exit,
}

/// Everything a running session mutates: settings, the current results and
/// the in-flight play requests. The active player lives in the orchestrator so
/// play tasks can reach it.
pub struct Session {
  pub settings: Settings,
  pub results: Vec<TrackRecord>,
  /// Most recent raw input line.
  pub last_line: String,
  client_id: String,
  search: SearchClient,
  orchestrator: Arc<Orchestrator>,
  palette: Palette,
  playbacks: JoinSet<Result<PlaybackReport>>,
}

impl Session {
  pub fn new(client_id: String, search: SearchClient, orchestrator: Orchestrator, palette: Palette) -> Self {
    Self {
      settings: Settings::default(),
      results: Vec::new(),
      last_line: String::new(),
      client_id,
      search,
      orchestrator: Arc::new(orchestrator),
      palette,
      playbacks: JoinSet::new(),
    }
  }

  /// Run one command. Errors are for the caller to report; the session stays usable.
  pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
    self.last_line = line.to_string();
    match Command::parse(line)? {
      Command::Empty => {}
      Command::Stop => return Ok(self.stop().await),
      Command::List => render(&self.results, &self.palette),
      Command::SetRange { min, max } => {
        self.settings.set_min(&min);
        self.settings.set_max(&max);
        info!(min_ms = self.settings.min_ms, max_ms = self.settings.max_ms, "settings: range updated");
      }
      Command::Info(index) => {
        let track = self.track(index)?;
        println!("{}", self.palette.paint(&self.palette.info, &track.description));
      }
      Command::Play(index) => self.play(index)?,
      Command::Search(term) => self.search(&term).await?,
    }
    Ok(Flow::Continue)
  }

  pub fn track(&self, index: usize) -> Result<&TrackRecord> {
    self.results.get(index).ok_or(Error::IndexOutOfRange { index, len: self.results.len() })
  }

  async fn stop(&mut self) -> Flow {
    if self.orchestrator.slot().stop().await { Flow::Continue } else { Flow::Exit }
  }

  /// Start a play request in the background so the prompt stays responsive.
  /// The track is copied out now; a later search can't invalidate it.
  fn play(&mut self, index: usize) -> Result<()> {
    let track = self.track(index)?.clone();
    info!(index, title = %track.title, "play: dispatching");
    let orchestrator = Arc::clone(&self.orchestrator);
    self.playbacks.spawn(async move {
      let title = track.title.clone();
      let result = orchestrator.play(track).await;
      if let Err(e) = &result {
        error!(title = %title, err = %e, "play: failed");
        println!("Playback failed: {}", e);
      }
      result
    });
    Ok(())
  }

  pub async fn search(&mut self, term: &str) -> Result<()> {
    println!("Searching {} ...\n", term);
    let mut tracks = self
      .search
      .search(term, &self.settings, &self.client_id)
      .await
      .map_err(|e| Error::Search(Box::new(e)))?;
    println!("... end of search");
    rank(&mut tracks);
    self.results = tracks;
    if self.results.is_empty() {
      println!("No results.");
    }
    render(&self.results, &self.palette);
    Ok(())
  }

  /// Collect play requests that have finished since the last command.
  pub fn reap_playbacks(&mut self) {
    while let Some(joined) = self.playbacks.try_join_next() {
      if let Err(e) = joined {
        warn!(err = %e, "play: task did not complete");
      }
    }
  }

  pub async fn shutdown(mut self) {
    self.orchestrator.slot().stop().await;
    self.playbacks.abort_all();
    while self.playbacks.join_next().await.is_some() {}
  }
}
