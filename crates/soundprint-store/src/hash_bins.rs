//! The bucket index: one inverted table per hash-table position.
//!
//! Every sub-fingerprint contributes exactly one `(hash_table, hash_bin)`
//! row per table. A similarity query probes each table with the query's bin
//! for that table and counts, per sub-fingerprint, how many tables agreed.
//! The cost is proportional to the size of the probed buckets, never to the
//! number of stored sub-fingerprints.

use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;

use soundprint_core::model::{check_hash_bins, SubFingerprintRef, TrackRef, HASH_TABLE_COUNT};
use soundprint_core::schema::{ref_column, Database};
use soundprint_core::{Error, Result};

/// Highest meaningful vote count: agreement in every table.
#[allow(clippy::cast_possible_truncation)]
pub const MAX_VOTES: u32 = HASH_TABLE_COUNT as u32;

/// Reject thresholds outside `1..=MAX_VOTES`.
pub fn check_threshold(threshold: u32) -> Result<()> {
    if (1..=MAX_VOTES).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::ThresholdOutOfRange {
            threshold,
            max: MAX_VOTES,
        })
    }
}

/// Read access to the bucket index.
///
/// Writes happen only through the sub-fingerprint store, inside the same
/// transaction as the sub-fingerprint row they describe.
#[derive(Debug, Clone)]
pub struct BucketIndex {
    db: Arc<Database>,
}

impl BucketIndex {
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Sub-fingerprints stored under `hash_bin` in table `hash_table`.
    ///
    /// A pair that was never written yields an empty list.
    pub fn bucket(&self, hash_table: usize, hash_bin: i64) -> Result<Vec<SubFingerprintRef>> {
        let table = u32::try_from(hash_table)
            .ok()
            .filter(|table| *table < MAX_VOTES)
            .map(i64::from)
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "hash table {hash_table} is outside of 0..{HASH_TABLE_COUNT}"
                ))
            })?;
        self.db.with_conn(|conn| bucket_members(conn, table, hash_bin))
    }

    /// Vote count for every sub-fingerprint sharing at least one bin with
    /// `hash_bins`.
    pub fn votes(&self, hash_bins: &[i64]) -> Result<HashMap<SubFingerprintRef, u32>> {
        check_hash_bins(hash_bins)?;
        self.db.with_conn(|conn| tally(conn, hash_bins))
    }

    /// Sub-fingerprints whose vote count reaches `threshold`, with their votes.
    ///
    /// No ordering is guaranteed.
    pub fn candidates(&self, hash_bins: &[i64], threshold: u32) -> Result<Vec<(SubFingerprintRef, u32)>> {
        check_threshold(threshold)?;
        Ok(self
            .votes(hash_bins)?
            .into_iter()
            .filter(|(_, votes)| *votes >= threshold)
            .collect())
    }

    /// Total number of index rows (25 per stored sub-fingerprint).
    pub fn entry_count(&self) -> Result<u64> {
        let count: i64 = self.db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM hash_bins", [], |row| row.get(0))?)
        })?;
        u64::try_from(count)
            .map_err(|_| Error::InvalidData(format!("hash_bins reports {count} rows")))
    }
}

fn bucket_members(conn: &Connection, hash_table: i64, hash_bin: i64) -> Result<Vec<SubFingerprintRef>> {
    let mut stmt = conn.prepare_cached(
        "SELECT sub_fingerprint_id FROM hash_bins
         WHERE hash_table = ?1 AND hash_bin = ?2",
    )?;
    let members = stmt
        .query_map(rusqlite::params![hash_table, hash_bin], |row| ref_column(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(members)
}

/// Probe every table and count agreements per sub-fingerprint.
///
/// The tally is local to the call.
pub(crate) fn tally(conn: &Connection, hash_bins: &[i64]) -> Result<HashMap<SubFingerprintRef, u32>> {
    let mut votes: HashMap<SubFingerprintRef, u32> = HashMap::new();
    for (hash_table, &hash_bin) in (0_i64..).zip(hash_bins) {
        for reference in bucket_members(conn, hash_table, hash_bin)? {
            *votes.entry(reference).or_insert(0) += 1;
        }
    }
    Ok(votes)
}

/// Add `reference` to the bucket of each table. Must run in the transaction
/// that inserts the sub-fingerprint row.
pub(crate) fn add(conn: &Connection, reference: SubFingerprintRef, hash_bins: &[i64]) -> Result<()> {
    check_hash_bins(hash_bins)?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO hash_bins (hash_table, hash_bin, sub_fingerprint_id) VALUES (?1, ?2, ?3)",
    )?;
    let id = reference.to_string();
    for (hash_table, &hash_bin) in (0_i64..).zip(hash_bins) {
        stmt.execute(rusqlite::params![hash_table, hash_bin, id])?;
    }
    Ok(())
}

/// Remove every index row of every sub-fingerprint owned by `track`.
///
/// Rows are deleted outright, so a bucket whose last member goes away
/// disappears with it.
pub(crate) fn remove_for_track(conn: &Connection, track: TrackRef) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM hash_bins WHERE sub_fingerprint_id IN (
            SELECT id FROM sub_fingerprints WHERE track_id = ?1
         )",
        [track.to_string()],
    )?;
    Ok(removed)
}
