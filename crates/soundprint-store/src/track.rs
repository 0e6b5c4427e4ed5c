use rusqlite::{Connection, OptionalExtension};
use std::sync::Arc;

use soundprint_core::model::{ReferenceAllocator, TrackRecord, TrackRef};
use soundprint_core::schema::{ref_column, Database};
use soundprint_core::{Error, Result};

use crate::{fingerprint, hash_bins, spectral, sub_fingerprint};

const TRACK_COLUMNS: &str =
    "id, isrc, artist, title, album, release_year, duration_secs, group_id";

/// What a track delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub hash_bins: usize,
    pub sub_fingerprints: usize,
    pub fingerprints: usize,
    pub spectral_images: usize,
    pub tracks: usize,
}

/// Durable track metadata; the identity source of truth for every other
/// store.
#[derive(Debug, Clone)]
pub struct TrackStore {
    db: Arc<Database>,
    allocator: Arc<dyn ReferenceAllocator>,
}

impl TrackStore {
    #[must_use]
    pub fn new(db: Arc<Database>, allocator: Arc<dyn ReferenceAllocator>) -> Self {
        Self { db, allocator }
    }

    /// Insert a new track and record its reference on `track`.
    ///
    /// Fails with [`Error::AlreadyPersisted`] if the track already has one.
    pub fn insert(&self, track: &mut TrackRecord) -> Result<TrackRef> {
        if let Some(existing) = track.reference {
            return Err(Error::AlreadyPersisted {
                entity: TrackRef::ENTITY,
                id: existing.to_string(),
            });
        }

        let reference = TrackRef::allocate(self.allocator.as_ref())?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tracks (
                    id, isrc, artist, title, album, release_year, duration_secs, group_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    reference.to_string(),
                    track.isrc,
                    track.artist,
                    track.title,
                    track.album,
                    track.release_year,
                    track.duration_secs,
                    track.group_id,
                ],
            )?;
            Ok(())
        })?;

        track.reference = Some(reference);
        log::info!("Inserted track {} ({} - {})", reference, track.artist, track.title);
        Ok(reference)
    }

    pub fn read_by_reference(&self, reference: TrackRef) -> Result<Option<TrackRecord>> {
        self.db.with_conn(|conn| {
            let track = conn
                .query_row(
                    &format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?1"),
                    [reference.to_string()],
                    row_to_track,
                )
                .optional()?;
            Ok(track)
        })
    }

    /// Earliest-inserted track with the given external id (ISRC).
    pub fn read_by_external_id(&self, isrc: &str) -> Result<Option<TrackRecord>> {
        self.db.with_conn(|conn| {
            let track = conn
                .query_row(
                    &format!(
                        "SELECT {TRACK_COLUMNS} FROM tracks WHERE isrc = ?1 ORDER BY rowid LIMIT 1"
                    ),
                    [isrc],
                    row_to_track,
                )
                .optional()?;
            Ok(track)
        })
    }

    pub fn read_by_artist_and_title(&self, artist: &str, title: &str) -> Result<Vec<TrackRecord>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRACK_COLUMNS} FROM tracks WHERE artist = ?1 AND title = ?2 ORDER BY rowid"
            ))?;
            let tracks = stmt
                .query_map([artist, title], row_to_track)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tracks)
        })
    }

    pub fn read_all(&self) -> Result<Vec<TrackRecord>> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TRACK_COLUMNS} FROM tracks ORDER BY rowid"))?;
            let tracks = stmt
                .query_map([], row_to_track)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tracks)
        })
    }

    /// Delete a track together with everything it owns.
    ///
    /// Index rows, sub-fingerprints, fingerprints and spectral images are
    /// removed before the track row, all in one transaction: either the whole
    /// cascade lands or the track is left exactly as it was. Deleting an
    /// unknown reference removes nothing.
    pub fn delete(&self, reference: TrackRef) -> Result<DeleteSummary> {
        let summary = self
            .db
            .with_transaction(|tx| delete_cascade(tx, reference))?;
        log::info!(
            "Deleted track {}: {} sub-fingerprints, {} hash bins, {} fingerprints, {} spectral images",
            reference,
            summary.sub_fingerprints,
            summary.hash_bins,
            summary.fingerprints,
            summary.spectral_images
        );
        Ok(summary)
    }
}

pub(crate) fn exists(conn: &Connection, reference: TrackRef) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM tracks WHERE id = ?1",
            [reference.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Fail with [`Error::NotFound`] unless the track exists.
pub(crate) fn require(conn: &Connection, reference: TrackRef) -> Result<()> {
    if exists(conn, reference)? {
        Ok(())
    } else {
        Err(Error::NotFound {
            entity: TrackRef::ENTITY,
            id: reference.to_string(),
        })
    }
}

fn delete_cascade(conn: &Connection, reference: TrackRef) -> Result<DeleteSummary> {
    let hash_bins = hash_bins::remove_for_track(conn, reference)?;
    let sub_fingerprints = sub_fingerprint::delete_rows_for_track(conn, reference)?;
    let fingerprints = fingerprint::delete_for_track(conn, reference)?;
    let spectral_images = spectral::delete_for_track(conn, reference)?;
    let tracks = conn.execute("DELETE FROM tracks WHERE id = ?1", [reference.to_string()])?;
    Ok(DeleteSummary {
        hash_bins,
        sub_fingerprints,
        fingerprints,
        spectral_images,
        tracks,
    })
}

fn row_to_track(row: &rusqlite::Row) -> rusqlite::Result<TrackRecord> {
    Ok(TrackRecord {
        reference: Some(ref_column(row, 0)?),
        isrc: row.get(1)?,
        artist: row.get(2)?,
        title: row.get(3)?,
        album: row.get(4)?,
        release_year: row.get(5)?,
        duration_secs: row.get(6)?,
        group_id: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundprint_core::model::{RandomReferences, SequentialReferences};

    fn store() -> TrackStore {
        let db = Arc::new(Database::open_in_memory().unwrap());
        TrackStore::new(db, Arc::new(RandomReferences))
    }

    #[test]
    fn test_track_round_trip() {
        let store = store();
        let mut track = TrackRecord::new("isrc", "artist", "title", "album", 1986, 200.5)
            .with_group_id("group");

        let reference = store.insert(&mut track).unwrap();
        assert_eq!(track.reference, Some(reference));

        let read = store.read_by_reference(reference).unwrap().unwrap();
        assert_eq!(read, track);
    }

    #[test]
    fn test_reinsert_is_rejected() {
        let store = store();
        let mut track = TrackRecord::new("isrc", "artist", "title", "album", 1986, 200.0);
        store.insert(&mut track).unwrap();

        let err = store.insert(&mut track).unwrap_err();
        assert!(matches!(err, Error::AlreadyPersisted { .. }));
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_read_missing_is_none() {
        let store = store();
        let missing = TrackRef::allocate(&RandomReferences).unwrap();
        assert!(store.read_by_reference(missing).unwrap().is_none());
        assert!(store.read_by_external_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_read_by_external_id_returns_earliest() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let store = TrackStore::new(db, Arc::new(SequentialReferences::new()));
        let mut first = TrackRecord::new("dup", "a", "t", "al", 2000, 10.0);
        let mut second = TrackRecord::new("dup", "b", "t", "al", 2001, 11.0);
        store.insert(&mut first).unwrap();
        store.insert(&mut second).unwrap();

        let read = store.read_by_external_id("dup").unwrap().unwrap();
        assert_eq!(read, first);
    }

    #[test]
    fn test_read_by_artist_and_title_keeps_duplicates() {
        let store = store();
        for isrc in ["a", "b"] {
            let mut track = TrackRecord::new(isrc, "artist", "title", "album", 1986, 200.0);
            store.insert(&mut track).unwrap();
        }
        let mut other = TrackRecord::new("c", "artist", "other", "album", 1986, 200.0);
        store.insert(&mut other).unwrap();

        assert_eq!(store.read_by_artist_and_title("artist", "title").unwrap().len(), 2);
        assert!(store.read_by_artist_and_title("nobody", "title").unwrap().is_empty());
    }

    #[test]
    fn test_delete_unknown_track_is_noop() {
        let store = store();
        let missing = TrackRef::allocate(&RandomReferences).unwrap();
        assert_eq!(store.delete(missing).unwrap(), DeleteSummary::default());
    }
}
