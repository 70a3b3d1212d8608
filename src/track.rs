use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

/// Wire format of `created_at`, e.g. `2014/03/05 21:07:44 +0000`.
pub const CREATED_AT_FORMAT: &str = "%Y/%m/%d %H:%M:%S %z";

/// Owner of a track. Descriptive only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserRef {
  #[serde(deserialize_with = "null_as_default")]
  pub id: u64,
  #[serde(deserialize_with = "null_as_default")]
  pub username: String,
  pub city: Option<String>,
  pub website: Option<String>,
  pub full_name: Option<String>,
}

/// One search hit as returned by `tracks.json`.
///
/// Missing or `null` fields fall back to their zero value instead of failing
/// the whole response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackRecord {
  #[serde(deserialize_with = "null_as_default")]
  pub title: String,
  /// Milliseconds.
  #[serde(deserialize_with = "null_as_default")]
  pub duration: u64,
  #[serde(deserialize_with = "null_as_default")]
  pub stream_url: String,
  pub download_url: Option<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub permalink_url: String,
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(deserialize_with = "null_as_default")]
  pub created_at: String,
  #[serde(deserialize_with = "null_as_default")]
  pub downloadable: bool,
  #[serde(deserialize_with = "null_as_default")]
  pub user: UserRef,
}

impl TrackRecord {
  pub fn created(&self) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT).ok()
  }

  pub fn has_description(&self) -> bool {
    !self.description.trim().is_empty()
  }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Datelike;

  #[test]
  fn parses_full_record() {
    let json = r#"{
      "title": "Deep Set",
      "duration": 3723000,
      "stream_url": "https://api.example/tracks/1/stream",
      "download_url": "https://api.example/tracks/1/download",
      "permalink_url": "https://example.com/dj/deep-set",
      "description": "two hours of dub",
      "created_at": "2014/03/05 21:07:44 +0000",
      "downloadable": true,
      "user": { "id": 7, "username": "dj", "city": "Berlin", "website": null, "full_name": "D J" }
    }"#;
    let t: TrackRecord = serde_json::from_str(json).unwrap();
    assert_eq!(t.title, "Deep Set");
    assert_eq!(t.duration, 3_723_000);
    assert_eq!(t.download_url.as_deref(), Some("https://api.example/tracks/1/download"));
    assert!(t.downloadable);
    assert_eq!(t.user.id, 7);
    assert_eq!(t.user.city.as_deref(), Some("Berlin"));
    assert_eq!(t.user.website, None);
    let created = t.created().unwrap();
    assert_eq!((created.year(), created.month(), created.day()), (2014, 3, 5));
  }

  #[test]
  fn missing_and_null_fields_default() {
    let json = r#"{ "title": "Bare", "description": null, "downloadable": null, "extra": [1, 2] }"#;
    let t: TrackRecord = serde_json::from_str(json).unwrap();
    assert_eq!(t.title, "Bare");
    assert_eq!(t.duration, 0);
    assert_eq!(t.description, "");
    assert!(!t.downloadable);
    assert_eq!(t.download_url, None);
    assert_eq!(t.user, UserRef::default());
    assert!(!t.has_description());
  }

  #[test]
  fn unparseable_created_at_is_none() {
    let t = TrackRecord { created_at: "yesterday".to_string(), ..Default::default() };
    assert!(t.created().is_none());
  }
}
