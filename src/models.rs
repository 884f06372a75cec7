//! Data structures for feed documents.
//!
//! Feeds and tracks keep every key they were loaded with. Only `id`, `title`
//! and `tracks` are interpreted; everything else rides along in `extra` or
//! `metadata` and is written back unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single media item within a feed.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Track {
    #[serde(
        default,
        deserialize_with = "non_empty_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Opaque fields such as `title`, `url` or `duration`.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Track {
    /// Build a track with an identifier and no metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// use feedmerge::models::Track;
    /// assert_eq!(Track::with_id("t1").id.as_deref(), Some("t1"));
    /// ```
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            metadata: Map::new(),
        }
    }
}

/// A named, uniquely identified list of tracks.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Feed {
    #[serde(
        default,
        deserialize_with = "non_empty_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Usually a string, but any JSON value is carried through as is.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<Value>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feed {
    /// Build a feed with an identifier and the given tracks.
    #[must_use]
    pub fn new(id: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            id: Some(id.into()),
            tracks,
            ..Self::default()
        }
    }

    /// Title used in messages, falling back to `Unknown` when the title is
    /// absent or not a string.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
    }

    /// Identifiers of the feed's tracks in order; id-less tracks are skipped.
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().filter_map(|t| t.id.as_deref())
    }
}

/// The on-disk `{ "feeds": [...] }` document.
///
/// Feeds are kept in insertion order; lookups by id go through
/// [`FeedCollection::get`]. Unrecognised top-level keys are preserved.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FeedCollection {
    pub feeds: Vec<Feed>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedCollection {
    #[must_use]
    pub fn new(feeds: Vec<Feed>) -> Self {
        Self {
            feeds,
            extra: Map::new(),
        }
    }

    /// Find a feed by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.id.as_deref() == Some(id))
    }

    /// Feed identifiers in order; id-less feeds are skipped.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.feeds.iter().filter_map(|f| f.id.as_deref())
    }
}

/// Deserialize an identifier, treating `null` and `""` as absent.
fn non_empty_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<String>::deserialize(deserializer)?;
    Ok(id.filter(|s| !s.is_empty()))
}

/// Deserialize a key that is present, keeping an explicit `null`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
