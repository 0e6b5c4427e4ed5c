use rusqlite::{Connection, OptionalExtension};
use std::sync::Arc;

use soundprint_core::model::{
    check_hash_bins, HashedFingerprint, ReferenceAllocator, SubFingerprintRecord,
    SubFingerprintRef, TrackRef,
};
use soundprint_core::schema::{json_column, ref_column, Database};
use soundprint_core::{Error, Result};

use crate::hash_bins::{self, BucketIndex};
use crate::track::require as require_track;

const SUB_FINGERPRINT_COLUMNS: &str = "s.id, s.track_id, s.signature, s.hash_bins, \
     s.sequence_number, s.timestamp, t.group_id";

/// One element of a batch that could not be stored.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the element in the submitted batch.
    pub index: usize,
    pub error: Error,
}

/// Outcome of [`SubFingerprintStore::insert_batch`].
///
/// Every element is its own unit of work: an element listed in `failed`
/// left nothing behind, and the elements in `inserted` stay committed
/// regardless of later failures. Both lists are in batch order.
#[derive(Debug, Default)]
pub struct BatchInsertReport {
    /// Batch position and new reference of each stored element.
    pub inserted: Vec<(usize, SubFingerprintRef)>,
    pub failed: Vec<BatchFailure>,
}

impl BatchInsertReport {
    /// Whether every element of the batch was stored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Reference assigned to the element at `index`, if it was stored.
    #[must_use]
    pub fn reference_at(&self, index: usize) -> Option<SubFingerprintRef> {
        self.inserted
            .iter()
            .find(|(position, _)| *position == index)
            .map(|(_, reference)| *reference)
    }
}

/// Durable sub-fingerprints and, through them, the bucket index.
#[derive(Debug, Clone)]
pub struct SubFingerprintStore {
    db: Arc<Database>,
    allocator: Arc<dyn ReferenceAllocator>,
    index: BucketIndex,
}

impl SubFingerprintStore {
    #[must_use]
    pub fn new(db: Arc<Database>, allocator: Arc<dyn ReferenceAllocator>) -> Self {
        let index = BucketIndex::new(Arc::clone(&db));
        Self {
            db,
            allocator,
            index,
        }
    }

    #[must_use]
    pub const fn index(&self) -> &BucketIndex {
        &self.index
    }

    /// Store each hashed fingerprint as a sub-fingerprint of `track` and fan
    /// its bins out into the bucket index.
    ///
    /// The whole batch is validated first; a malformed element fails the
    /// call before anything is written. After that each element commits on
    /// its own (record plus all of its index rows, or nothing), and storage
    /// failures are collected in the report instead of aborting the batch.
    pub fn insert_batch(
        &self,
        hashed: &[HashedFingerprint],
        track: TrackRef,
    ) -> Result<BatchInsertReport> {
        for fingerprint in hashed {
            fingerprint.validate()?;
        }
        self.db.with_conn(|conn| require_track(conn, track))?;

        let mut report = BatchInsertReport::default();
        for (index, fingerprint) in hashed.iter().enumerate() {
            match self.insert_one(fingerprint, track) {
                Ok(reference) => report.inserted.push((index, reference)),
                Err(error) => {
                    log::warn!(
                        "Failed to store sub-fingerprint {} of track {}: {}",
                        index,
                        track,
                        error
                    );
                    report.failed.push(BatchFailure { index, error });
                }
            }
        }

        log::info!(
            "Stored {} of {} sub-fingerprints for track {}",
            report.inserted.len(),
            hashed.len(),
            track
        );
        Ok(report)
    }

    fn insert_one(&self, fingerprint: &HashedFingerprint, track: TrackRef) -> Result<SubFingerprintRef> {
        let reference = SubFingerprintRef::allocate(self.allocator.as_ref())?;
        self.db.with_transaction(|tx| {
            // The track may have been deleted since the batch started.
            require_track(tx, track)?;
            tx.execute(
                "INSERT INTO sub_fingerprints (
                    id, track_id, signature, hash_bins, sequence_number, timestamp
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    reference.to_string(),
                    track.to_string(),
                    fingerprint.signature,
                    serde_json::to_string(&fingerprint.hash_bins)?,
                    fingerprint.sequence_number,
                    fingerprint.timestamp,
                ],
            )?;
            hash_bins::add(tx, reference, &fingerprint.hash_bins)?;
            Ok(reference)
        })
    }

    pub fn read_by_reference(&self, reference: SubFingerprintRef) -> Result<Option<SubFingerprintRecord>> {
        self.db.with_conn(|conn| read_one(conn, reference, None))
    }

    /// All sub-fingerprints of `track`, ordered by sequence number.
    pub fn read_by_track(&self, track: TrackRef) -> Result<Vec<SubFingerprintRecord>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUB_FINGERPRINT_COLUMNS}
                 FROM sub_fingerprints s JOIN tracks t ON t.id = s.track_id
                 WHERE s.track_id = ?1
                 ORDER BY s.sequence_number, s.rowid"
            ))?;
            let records = stmt
                .query_map([track.to_string()], row_to_sub_fingerprint)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }

    /// Sub-fingerprints that agree with `query` in at least `threshold`
    /// hash tables.
    ///
    /// With `group_id`, only sub-fingerprints whose track belongs to that
    /// group are returned. Results carry the owning track's group id and come
    /// in no particular order.
    pub fn query_by_threshold(
        &self,
        query: &[i64],
        threshold: u32,
        group_id: Option<&str>,
    ) -> Result<Vec<SubFingerprintRecord>> {
        check_hash_bins(query)?;
        hash_bins::check_threshold(threshold)?;

        self.db.with_conn(|conn| {
            let votes = hash_bins::tally(conn, query)?;
            let candidates = votes.len();

            let mut matches = Vec::new();
            for (reference, _) in votes.into_iter().filter(|(_, count)| *count >= threshold) {
                if let Some(record) = read_one(conn, reference, group_id)? {
                    matches.push(record);
                }
            }

            log::debug!(
                "Threshold {} query: {} candidates, {} matches",
                threshold,
                candidates,
                matches.len()
            );
            Ok(matches)
        })
    }

    /// Remove every sub-fingerprint of `track` and its index rows.
    pub fn delete_by_track(&self, track: TrackRef) -> Result<usize> {
        self.db.with_transaction(|tx| {
            hash_bins::remove_for_track(tx, track)?;
            delete_rows_for_track(tx, track)
        })
    }
}

/// Delete the sub-fingerprint rows of `track`. The caller must already have
/// removed their index rows in the same transaction.
pub(crate) fn delete_rows_for_track(conn: &Connection, track: TrackRef) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM sub_fingerprints WHERE track_id = ?1",
        [track.to_string()],
    )?;
    Ok(removed)
}

fn read_one(
    conn: &Connection,
    reference: SubFingerprintRef,
    group_id: Option<&str>,
) -> Result<Option<SubFingerprintRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SUB_FINGERPRINT_COLUMNS}
         FROM sub_fingerprints s JOIN tracks t ON t.id = s.track_id
         WHERE s.id = ?1 AND (?2 IS NULL OR t.group_id = ?2)"
    ))?;
    let record = stmt
        .query_row(
            rusqlite::params![reference.to_string(), group_id],
            row_to_sub_fingerprint,
        )
        .optional()?;
    Ok(record)
}

fn row_to_sub_fingerprint(row: &rusqlite::Row) -> rusqlite::Result<SubFingerprintRecord> {
    Ok(SubFingerprintRecord {
        reference: ref_column(row, 0)?,
        track: ref_column(row, 1)?,
        signature: row.get(2)?,
        hash_bins: json_column(row, 3)?,
        sequence_number: row.get(4)?,
        timestamp: row.get(5)?,
        group_id: row.get(6)?,
    })
}
