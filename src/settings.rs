use crate::constants::constants;

const MS_PER_MINUTE: i64 = 60 * 1000;

/// Duration filter sent with every search, in milliseconds.
///
/// `max_ms >= min_ms` is expected but not enforced; an inverted range is passed
/// to the search API as typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
  pub min_ms: i64,
  pub max_ms: i64,
}

impl Default for Settings {
  fn default() -> Self {
    let c = constants();
    Self { min_ms: minutes_to_ms(c.default_min_minutes), max_ms: minutes_to_ms(c.default_max_minutes) }
  }
}

impl Settings {
  pub fn set_min(&mut self, minutes: &str) {
    self.min_ms = minutes_to_ms(parse_lenient(minutes));
  }

  pub fn set_max(&mut self, minutes: &str) {
    self.max_ms = minutes_to_ms(parse_lenient(minutes));
  }
}

/// Parse an integer the way the command line expects: anything unparseable is zero.
pub fn parse_lenient(text: &str) -> i64 {
  text.trim().parse().unwrap_or(0)
}

fn minutes_to_ms(minutes: i64) -> i64 {
  minutes.saturating_mul(MS_PER_MINUTE)
}
