use crate::error::{Error, Result};
use crate::settings::parse_lenient;

const SET_RANGE_USAGE: &str = "set range <minMinutes> <maxMinutes>";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Blank line.
  Empty,
  /// `x`: stop the player, or exit when nothing is playing.
  Stop,
  /// `ll`
  List,
  /// `set range <min> <max>`, minutes as typed.
  SetRange { min: String, max: String },
  /// `i <index>`
  Info(usize),
  /// A line of digits.
  Play(usize),
  Search(String),
}

impl Command {
  pub fn parse(line: &str) -> Result<Self> {
    let line = line.trim();
    if line.is_empty() {
      return Ok(Self::Empty);
    }
    if line == "x" {
      return Ok(Self::Stop);
    }
    if line == "ll" {
      return Ok(Self::List);
    }
    if let Some(rest) = line.strip_prefix("set ") {
      return parse_set(rest);
    }
    if let Some(rest) = line.strip_prefix("i ") {
      return Ok(Self::Info(parse_index(rest)));
    }
    if let Some(index) = parse_digits(line) {
      return Ok(Self::Play(index));
    }
    Ok(Self::Search(line.to_string()))
  }
}

fn parse_set(rest: &str) -> Result<Command> {
  let mut words = rest.split_whitespace();
  match (words.next(), words.next(), words.next()) {
    (Some("range"), Some(min), Some(max)) => Ok(Command::SetRange { min: min.to_string(), max: max.to_string() }),
    _ => Err(Error::Usage(SET_RANGE_USAGE.to_string())),
  }
}

/// An all-digit word as an index. Too many digits to be an index becomes
/// `usize::MAX` so the range check reports it.
fn parse_digits(text: &str) -> Option<usize> {
  if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  Some(text.parse().unwrap_or(usize::MAX))
}

/// Digits as for play; anything else is lenient like the duration settings, so garbage is index 0.
fn parse_index(text: &str) -> usize {
  let text = text.trim();
  parse_digits(text).unwrap_or_else(|| usize::try_from(parse_lenient(text)).unwrap_or(0))
}
