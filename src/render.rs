use crossterm::style::{Color, ResetColor, SetForegroundColor};

use crate::constants::constants;
use crate::track::TrackRecord;

// --- Palette ---

/// Escape sequences used by the result table. Empty strings render plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
  /// Rank of tracks that can only be streamed.
  pub muted: String,
  /// Description marker and `i <index>` output.
  pub info: String,
  /// Trailing duration / user / date block.
  pub accent: String,
  pub reset: String,
}

impl Palette {
  pub fn ansi() -> Self {
    Self {
      muted: SetForegroundColor(Color::DarkGrey).to_string(),
      info: SetForegroundColor(Color::Yellow).to_string(),
      accent: SetForegroundColor(Color::Cyan).to_string(),
      reset: ResetColor.to_string(),
    }
  }

  pub fn plain() -> Self {
    Self::default()
  }

  pub fn for_color(enabled: bool) -> Self {
    if enabled { Self::ansi() } else { Self::plain() }
  }

  pub fn paint(&self, color: &str, text: &str) -> String {
    if color.is_empty() { text.to_string() } else { format!("{}{}{}", color, text, self.reset) }
  }
}

// --- Helpers ---

const FILLED: char = '-';
const DESCRIPTION_MARK: &str = "[i]";

/// Number of whole `bucket_minutes` slices in a track.
pub fn duration_bucket(duration_ms: u64) -> usize {
  let minutes = duration_ms / 1000 / 60;
  (minutes / constants().bucket_minutes.max(1)) as usize
}

/// `H:MM:SS` for an hour or more, `M:SS` below.
pub fn format_duration(duration_ms: u64) -> String {
  let total = duration_ms / 1000;
  let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

/// `YYYY Mon D`, or empty when the timestamp doesn't parse.
pub fn format_created(track: &TrackRecord) -> String {
  track.created().map(|d| d.format("%Y %b %-d").to_string()).unwrap_or_default()
}

/// Relative length indicator: `bucket` filled cells padded to `width`.
fn duration_bar(bucket: usize, width: usize) -> String {
  (0..width).map(|i| if i < bucket { FILLED } else { ' ' }).collect()
}

// --- Table ---

/// Format one line per track. The bar is scaled to the longest track in this
/// set, so every bar has the same width.
pub fn render_lines(tracks: &[TrackRecord], palette: &Palette) -> Vec<String> {
  let max_bucket = tracks.iter().map(|t| duration_bucket(t.duration)).max().unwrap_or(0);

  tracks
    .iter()
    .enumerate()
    .map(|(k, track)| {
      let rank = format!("{:02}", k);
      let rank = if track.downloadable { rank } else { palette.paint(&palette.muted, &rank) };
      let bar = duration_bar(duration_bucket(track.duration), max_bucket);
      let desc = if track.has_description() {
        palette.paint(&palette.info, DESCRIPTION_MARK)
      } else {
        " ".repeat(DESCRIPTION_MARK.len())
      };
      let tail = format!("-> {} -> {} {}", format_duration(track.duration), track.user.username, format_created(track));
      format!("{} {} {} {}  {}", rank, bar, desc, track.title, palette.paint(&palette.accent, tail.trim_end()))
    })
    .collect()
}

pub fn render(tracks: &[TrackRecord], palette: &Palette) {
  for line in render_lines(tracks, palette) {
    println!("{}", line);
  }
}
