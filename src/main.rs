mod command;
mod config;
mod constants;
mod display;
mod error;
mod playback;
mod player;
mod rank;
mod render;
mod session;
mod settings;
mod soundcloud;
#[cfg(test)]
mod test_support;
mod track;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use config::{Config, PlayerConfig, client_id_candidates, project_dirs, read_client_id};
use constants::constants;
use display::CliColorMode;
use playback::{Orchestrator, Readiness};
use player::Player;
use render::Palette;
use session::{Flow, Session};
use soundcloud::SearchClient;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// File containing the API client id (default: client_id.txt next to the binary, then ./client_id.txt)
  #[arg(long)]
  client_id_file: Option<PathBuf>,

  /// Player executable; replaces the configured player and its arguments
  #[arg(long)]
  player: Option<String>,

  /// Search API base URL
  #[arg(long)]
  api_base: Option<String>,

  /// Colorize the result table: 'auto', 'always' or 'never'
  #[arg(long, value_enum)]
  color: Option<CliColorMode>,

  /// Directory for scplay.log (default: the platform data directory)
  #[arg(long)]
  log_dir: Option<PathBuf>,

  /// Print a shell completion script and exit
  #[arg(long, value_enum)]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a file; stdout belongs to the result table.
fn init_logging(log_dir: Option<&Path>) -> Result<WorkerGuard> {
  let dir = match log_dir {
    Some(dir) => dir.to_path_buf(),
    None => project_dirs().map(|d| d.data_local_dir().to_path_buf()).unwrap_or_else(std::env::temp_dir),
  };
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, "scplay.log"));
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_writer(writer).with_ansi(false).with_env_filter(filter).init();
  Ok(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging(args.log_dir.as_deref())?;
  info!(version = env!("CARGO_PKG_VERSION"), "starting");

  let config = Config::load();
  let client_id = read_client_id(&client_id_candidates(args.client_id_file.as_deref(), &config))?;
  let session = build_session(&args, &config, client_id)?;
  run(session).await
}

fn build_session(args: &Args, config: &Config, client_id: String) -> Result<Session> {
  let c = constants();
  let http = Client::builder()
    .connect_timeout(Duration::from_secs(c.connect_timeout_secs))
    .build()
    .context("Failed to build HTTP client")?;

  let api_base = args.api_base.clone().unwrap_or_else(|| config.api_base());
  let search_timeout = Duration::from_secs(config.search_timeout_secs.unwrap_or(c.search_timeout_secs));
  let search = SearchClient::new(http.clone(), api_base, search_timeout);

  let player = match &args.player {
    Some(program) => PlayerConfig { program: program.clone(), args: Vec::new() },
    None => config.player(),
  };
  let readiness =
    Readiness { min_bytes: c.min_buffered_bytes, timeout: Duration::from_millis(c.readiness_timeout_ms) };
  let orchestrator = Orchestrator::new(http, client_id.clone(), Player::new(player), config.scratch_file(), readiness);

  let palette = Palette::for_color(display::resolve_color(args.color, config.color));
  Ok(Session::new(client_id, search, orchestrator, palette))
}

async fn run(mut session: Session) -> Result<()> {
  println!("Please type a search term or 'x' to exit ...");
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
    session.reap_playbacks();
    match session.handle_line(&line).await {
      Ok(Flow::Continue) => {}
      Ok(Flow::Exit) => break,
      Err(e) => {
        warn!(line = %session.last_line, err = %e, "command failed");
        println!("{}", e);
      }
    }
  }

  info!("exiting");
  session.shutdown().await;
  Ok(())
}
