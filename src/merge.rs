//! Feed reconciliation.
//!
//! [`merge_collections`] folds a source collection into a target one under a
//! [`MergeMode`]. Every decision is recorded in a [`MergeReport`] so callers
//! can render progress without the merger touching any output stream.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::warn;

use crate::models::{Feed, FeedCollection, Track};

/// Policy applied when a source feed's id already exists in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Append tracks the target feed does not have yet.
    #[default]
    Merge,
    /// Swap the target feed for the source feed wholesale.
    Replace,
}

impl MergeMode {
    #[must_use]
    pub fn from_replace_flag(replace: bool) -> Self {
        if replace { Self::Replace } else { Self::Merge }
    }
}

/// One decision taken while merging or sanitising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeEvent {
    FeedAdded { feed_id: String },
    FeedMerged { feed_id: String },
    FeedReplaced { feed_id: String },
    TrackAdded { feed_id: String, track_id: String },
    TrackExists { feed_id: String, track_id: String },
    /// A feed without an id, identified by its title.
    FeedSkipped { title: String },
    TrackSkipped { feed_id: String },
    DuplicateFeed { feed_id: String },
    /// A repeated track id within one feed; only the first copy is kept.
    DuplicateTrack { feed_id: String, track_id: String },
}

impl MergeEvent {
    /// Whether the event reports rejected input rather than a change.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::FeedSkipped { .. }
                | Self::TrackSkipped { .. }
                | Self::DuplicateFeed { .. }
                | Self::DuplicateTrack { .. }
        )
    }
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeedAdded { feed_id } => write!(f, "Adding new feed: {feed_id}"),
            Self::FeedMerged { feed_id } => write!(f, "Merging tracks for feed: {feed_id}"),
            Self::FeedReplaced { feed_id } => write!(f, "Replacing existing feed: {feed_id}"),
            Self::TrackAdded { track_id, .. } => write!(f, "  Added new track: {track_id}"),
            Self::TrackExists { track_id, .. } => {
                write!(f, "  Track already exists: {track_id}")
            }
            Self::FeedSkipped { title } => write!(f, "Skipping feed without ID: {title}"),
            Self::TrackSkipped { feed_id } => {
                write!(f, "  Skipping track without ID in feed {feed_id}")
            }
            Self::DuplicateFeed { feed_id } => {
                write!(f, "Skipping duplicate feed: {feed_id}")
            }
            Self::DuplicateTrack { feed_id, track_id } => {
                write!(f, "  Skipping duplicate track {track_id} in feed {feed_id}")
            }
        }
    }
}

/// Ordered record of merge decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub events: Vec<MergeEvent>,
}

/// Per-kind event counts, see [`MergeReport::counts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub feeds_added: usize,
    pub feeds_merged: usize,
    pub feeds_replaced: usize,
    pub tracks_added: usize,
    pub tracks_existing: usize,
    pub skipped: usize,
}

impl MergeReport {
    fn record(&mut self, event: MergeEvent) {
        if event.is_warning() {
            warn!("{}", event.to_string().trim_start());
        }
        self.events.push(event);
    }

    /// Append another report's events after this one's.
    pub fn extend(&mut self, other: Self) {
        self.events.extend(other.events);
    }

    /// Tally events by kind.
    #[must_use]
    pub fn counts(&self) -> MergeCounts {
        let mut counts = MergeCounts::default();
        for event in &self.events {
            let slot = match event {
                MergeEvent::FeedAdded { .. } => &mut counts.feeds_added,
                MergeEvent::FeedMerged { .. } => &mut counts.feeds_merged,
                MergeEvent::FeedReplaced { .. } => &mut counts.feeds_replaced,
                MergeEvent::TrackAdded { .. } => &mut counts.tracks_added,
                MergeEvent::TrackExists { .. } => &mut counts.tracks_existing,
                MergeEvent::FeedSkipped { .. }
                | MergeEvent::TrackSkipped { .. }
                | MergeEvent::DuplicateFeed { .. }
                | MergeEvent::DuplicateTrack { .. } => &mut counts.skipped,
            };
            *slot += 1;
        }
        counts
    }
}

/// Drop id-less and repeated tracks from `feed`, keeping first occurrences.
fn sanitize_tracks(feed: &mut Feed, report: &mut MergeReport) {
    let feed_id = feed.id.clone().unwrap_or_default();
    let mut seen = HashSet::new();
    let tracks = std::mem::take(&mut feed.tracks);
    for track in tracks {
        let Some(track_id) = track.id.clone() else {
            report.record(MergeEvent::TrackSkipped {
                feed_id: feed_id.clone(),
            });
            continue;
        };
        if seen.insert(track_id.clone()) {
            feed.tracks.push(track);
        } else {
            report.record(MergeEvent::DuplicateTrack {
                feed_id: feed_id.clone(),
                track_id,
            });
        }
    }
}

/// Restore the collection invariants on a freshly loaded target.
///
/// Feeds and tracks without an id are removed, and repeated ids keep only
/// their first occurrence. Returns what was dropped.
pub fn sanitize_collection(collection: &mut FeedCollection) -> MergeReport {
    let mut report = MergeReport::default();
    let mut seen = HashSet::new();
    let feeds = std::mem::take(&mut collection.feeds);
    for mut feed in feeds {
        let Some(feed_id) = feed.id.clone() else {
            report.record(MergeEvent::FeedSkipped {
                title: feed.display_title().to_owned(),
            });
            continue;
        };
        if !seen.insert(feed_id.clone()) {
            report.record(MergeEvent::DuplicateFeed { feed_id });
            continue;
        }
        sanitize_tracks(&mut feed, &mut report);
        collection.feeds.push(feed);
    }
    report
}

/// Append the tracks of `incoming` that `existing` lacks, in order.
fn merge_tracks(existing: &mut Feed, incoming: Vec<Track>, report: &mut MergeReport) {
    let feed_id = existing.id.clone().unwrap_or_default();
    let mut known: HashSet<String> = existing.track_ids().map(str::to_owned).collect();
    for track in incoming {
        let Some(track_id) = track.id.clone() else {
            report.record(MergeEvent::TrackSkipped {
                feed_id: feed_id.clone(),
            });
            continue;
        };
        if known.insert(track_id.clone()) {
            existing.tracks.push(track);
            report.record(MergeEvent::TrackAdded {
                feed_id: feed_id.clone(),
                track_id,
            });
        } else {
            report.record(MergeEvent::TrackExists {
                feed_id: feed_id.clone(),
                track_id,
            });
        }
    }
}

/// Merge `source` into `target` under `mode`.
///
/// Feeds new to the target are appended in source order. Feeds already
/// present either gain the tracks they lack ([`MergeMode::Merge`]) or are
/// replaced in place ([`MergeMode::Replace`]). Entries without an id are
/// skipped and logged.
///
/// # Examples
///
/// ```
/// use feedmerge::merge::{MergeMode, merge_collections};
/// use feedmerge::models::{Feed, FeedCollection, Track};
///
/// let mut target = FeedCollection::new(vec![Feed::new("a", vec![Track::with_id("t1")])]);
/// let source = FeedCollection::new(vec![Feed::new(
///     "a",
///     vec![Track::with_id("t1"), Track::with_id("t2")],
/// )]);
/// merge_collections(&mut target, source, MergeMode::Merge);
/// let ids: Vec<_> = target.feeds[0].track_ids().collect();
/// assert_eq!(ids, ["t1", "t2"]);
/// ```
pub fn merge_collections(
    target: &mut FeedCollection,
    source: FeedCollection,
    mode: MergeMode,
) -> MergeReport {
    let mut report = MergeReport::default();
    let mut index: HashMap<String, usize> = target
        .feeds
        .iter()
        .enumerate()
        .filter_map(|(pos, feed)| feed.id.clone().map(|id| (id, pos)))
        .collect();

    for mut feed in source.feeds {
        let Some(feed_id) = feed.id.clone() else {
            report.record(MergeEvent::FeedSkipped {
                title: feed.display_title().to_owned(),
            });
            continue;
        };

        let existing = index
            .get(&feed_id)
            .and_then(|&pos| target.feeds.get_mut(pos));
        match (existing, mode) {
            (Some(slot), MergeMode::Replace) => {
                report.record(MergeEvent::FeedReplaced { feed_id });
                sanitize_tracks(&mut feed, &mut report);
                *slot = feed;
            }
            (Some(slot), MergeMode::Merge) => {
                report.record(MergeEvent::FeedMerged { feed_id });
                merge_tracks(slot, feed.tracks, &mut report);
            }
            (None, _) => {
                report.record(MergeEvent::FeedAdded {
                    feed_id: feed_id.clone(),
                });
                sanitize_tracks(&mut feed, &mut report);
                index.insert(feed_id, target.feeds.len());
                target.feeds.push(feed);
            }
        }
    }
    report
}
