use serde::{Deserialize, Serialize};

use crate::model::ids::TrackRef;

/// Metadata for a fingerprinted track.
///
/// `reference` is `None` until the track has been inserted; the store
/// assigns it and it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub reference: Option<TrackRef>,

    /// External catalog identifier (usually an ISRC).
    pub isrc: String,

    pub artist: String,
    pub title: String,
    pub album: String,
    pub release_year: i32,

    /// Track length in seconds.
    pub duration_secs: f64,

    /// Tenant/group partition used to filter similarity queries.
    pub group_id: Option<String>,
}

impl TrackRecord {
    #[must_use]
    pub fn new(
        isrc: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
        album: impl Into<String>,
        release_year: i32,
        duration_secs: f64,
    ) -> Self {
        Self {
            reference: None,
            isrc: isrc.into(),
            artist: artist.into(),
            title: title.into(),
            album: album.into(),
            release_year,
            duration_secs,
            group_id: None,
        }
    }

    #[must_use]
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Whether this track has been written to the store.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.reference.is_some()
    }
}
