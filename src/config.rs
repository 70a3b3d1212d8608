use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::constants;

/// User overrides read from `config.toml`. Every field is optional; anything
/// left out falls back to the compiled-in constants.
#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct Config {
  pub api_base: Option<String>,
  pub client_id_file: Option<PathBuf>,
  pub player: Option<PlayerConfig>,
  pub scratch_file: Option<PathBuf>,
  pub search_timeout_secs: Option<u64>,
  pub color: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerConfig {
  pub program: String,
  #[serde(default)]
  pub args: Vec<String>,
}

impl Default for PlayerConfig {
  fn default() -> Self {
    let c = constants();
    Self { program: c.player_program.clone(), args: c.player_args.clone() }
  }
}

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "scplay")
}

impl Config {
  pub fn load() -> Self {
    let Some(proj_dirs) = project_dirs() else { return Self::default() };
    let config_file = proj_dirs.config_dir().join("config.toml");
    match std::fs::read_to_string(&config_file) {
      Ok(content) => match Self::parse(&content) {
        Ok(config) => {
          debug!(path = %config_file.display(), "config: loaded");
          config
        }
        Err(e) => {
          warn!(path = %config_file.display(), err = %e, "config: invalid, using defaults");
          Self::default()
        }
      },
      Err(_) => Self::default(),
    }
  }

  pub fn parse(content: &str) -> Result<Self> {
    toml::from_str(content).context("Failed to parse config.toml")
  }

  pub fn api_base(&self) -> String {
    self.api_base.clone().unwrap_or_else(|| constants().api_base.clone())
  }

  pub fn player(&self) -> PlayerConfig {
    self.player.clone().unwrap_or_default()
  }

  pub fn scratch_file(&self) -> PathBuf {
    self.scratch_file.clone().unwrap_or_else(|| std::env::temp_dir().join(&constants().scratch_file))
  }
}

// --- Credential ---

/// Places to look for the client id file, most specific first.
pub fn client_id_candidates(explicit: Option<&Path>, config: &Config) -> Vec<PathBuf> {
  if let Some(path) = explicit.or(config.client_id_file.as_deref()) {
    return vec![path.to_path_buf()];
  }
  let name = &constants().client_id_file;
  let mut candidates = Vec::new();
  if let Ok(exe) = std::env::current_exe()
    && let Some(dir) = exe.parent()
  {
    candidates.push(dir.join(name));
  }
  candidates.push(PathBuf::from(".").join(name));
  candidates
}

/// Read the API client id from the first candidate file that exists.
pub fn read_client_id(candidates: &[PathBuf]) -> Result<String> {
  for path in candidates {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
      Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let client_id = content.trim();
    if client_id.is_empty() {
      bail!("{} is empty", path.display());
    }
    debug!(path = %path.display(), "config: client id loaded");
    return Ok(client_id.to_string());
  }
  let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
  bail!("No client id file found (tried: {}). Pass --client-id-file <path>.", tried.join(", "))
}
