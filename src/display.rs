use clap::ValueEnum;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliColorMode {
  Auto,
  Always,
  Never,
}

/// Decide whether the result table gets ANSI colors.
///
/// Probe order for `auto`: `NO_COLOR` set > `TERM=dumb` > stdout not a tty > color.
pub fn detect_color() -> bool {
  if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
    return false;
  }
  if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
    return false;
  }
  std::io::stdout().is_terminal()
}

/// CLI flag wins; otherwise the config file's `color`, otherwise detection.
pub fn resolve_color(cli: Option<CliColorMode>, config: Option<bool>) -> bool {
  match cli {
    Some(CliColorMode::Always) => true,
    Some(CliColorMode::Never) => false,
    Some(CliColorMode::Auto) => detect_color(),
    None => config.unwrap_or_else(detect_color),
  }
}
