use std::process::Stdio;
use std::sync::Arc;
use tokio::{
  process::{Child, Command},
  sync::Mutex,
};
use tracing::{info, warn};

use crate::config::PlayerConfig;
use crate::error::{Error, Result};

/// Spawns the external player. The target (URL or file path) is always the
/// last argument; the player's stdio is detached.
#[derive(Debug, Clone)]
pub struct Player {
  config: PlayerConfig,
}

impl Player {
  pub fn new(config: PlayerConfig) -> Self {
    Self { config }
  }

  pub fn launch(&self, target: &str) -> Result<Child> {
    let mut cmd = Command::new(&self.config.program);
    cmd.args(&self.config.args).arg(target);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    let child =
      cmd.spawn().map_err(|source| Error::PlayerLaunch { program: self.config.program.clone(), source })?;
    info!(program = %self.config.program, pid = ?child.id(), target = %target, "player: started");
    Ok(child)
  }
}

struct ActivePlayer {
  child: Child,
  target: String,
}

/// The one playback process the session tracks.
///
/// Concurrent play requests race to install their process here; the swap
/// happens under the lock and the displaced process is killed afterwards.
#[derive(Clone, Default)]
pub struct PlayerSlot {
  inner: Arc<Mutex<Option<ActivePlayer>>>,
}

impl PlayerSlot {
  pub async fn replace(&self, child: Child, target: &str) {
    let previous = self.inner.lock().await.replace(ActivePlayer { child, target: target.to_string() });
    if let Some(old) = previous {
      info!(target = %old.target, "player: superseded");
      kill(old).await;
    }
  }

  /// Kill the active process, if any. Returns whether one was active.
  pub async fn stop(&self) -> bool {
    let Some(active) = self.inner.lock().await.take() else { return false };
    info!(target = %active.target, "player: stopped");
    kill(active).await;
    true
  }

  #[cfg(test)]
  pub async fn is_active(&self) -> bool {
    self.inner.lock().await.is_some()
  }

  #[cfg(test)]
  pub async fn current_target(&self) -> Option<String> {
    self.inner.lock().await.as_ref().map(|a| a.target.clone())
  }
}

async fn kill(mut active: ActivePlayer) {
  if let Err(e) = active.child.kill().await {
    warn!(target = %active.target, err = %e, "player: failed to kill process");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::sleeping_player;

  #[tokio::test]
  async fn missing_binary_is_a_launch_error() {
    let player = Player::new(PlayerConfig { program: "/nonexistent/player".to_string(), args: Vec::new() });
    let err = player.launch("x").unwrap_err();
    assert!(matches!(err, Error::PlayerLaunch { ref program, .. } if program == "/nonexistent/player"));
  }

  #[tokio::test]
  async fn replace_keeps_only_the_newest() {
    let player = Player::new(sleeping_player());
    let slot = PlayerSlot::default();
    slot.replace(player.launch("first").unwrap(), "first").await;
    slot.replace(player.launch("second").unwrap(), "second").await;
    assert_eq!(slot.current_target().await.as_deref(), Some("second"));
    assert!(slot.stop().await);
    assert!(!slot.is_active().await);
  }

  #[tokio::test]
  async fn replaced_process_is_killed() {
    let player = Player::new(sleeping_player());
    let slot = PlayerSlot::default();
    let first = player.launch("first").unwrap();
    let pid = first.id().unwrap();
    slot.replace(first, "first").await;
    slot.replace(player.launch("second").unwrap(), "second").await;

    let alive = format!("kill -0 {} 2>/dev/null", pid);
    let probe = std::process::Command::new("sh").args(["-c", &alive]).status().unwrap();
    assert!(!probe.success(), "superseded player {} is still running", pid);
    slot.stop().await;
  }

  #[tokio::test]
  async fn stop_on_empty_slot_reports_nothing_to_stop() {
    let slot = PlayerSlot::default();
    assert!(!slot.stop().await);
  }
}
