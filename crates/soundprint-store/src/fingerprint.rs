use rusqlite::Connection;
use std::sync::Arc;

use soundprint_core::model::fingerprint::{pack_bits, unpack_bits};
use soundprint_core::model::{FingerprintData, FingerprintRef, ReferenceAllocator, TrackRef};
use soundprint_core::schema::{ref_column, Database};
use soundprint_core::{Error, Result};

use crate::track::require as require_track;

/// Coarse per-track fingerprints, keyed only by owning track.
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    db: Arc<Database>,
    allocator: Arc<dyn ReferenceAllocator>,
}

impl FingerprintStore {
    #[must_use]
    pub fn new(db: Arc<Database>, allocator: Arc<dyn ReferenceAllocator>) -> Self {
        Self { db, allocator }
    }

    /// Insert a fingerprint and record its reference on `fingerprint`.
    pub fn insert(&self, fingerprint: &mut FingerprintData) -> Result<FingerprintRef> {
        if let Some(existing) = fingerprint.reference {
            return Err(Error::AlreadyPersisted {
                entity: FingerprintRef::ENTITY,
                id: existing.to_string(),
            });
        }

        let reference = FingerprintRef::allocate(self.allocator.as_ref())?;
        let bits = i64::try_from(fingerprint.signature.len()).map_err(|_| {
            Error::InvalidData(format!(
                "fingerprint of {} bits is too long",
                fingerprint.signature.len()
            ))
        })?;
        self.db.with_transaction(|tx| {
            require_track(tx, fingerprint.track)?;
            tx.execute(
                "INSERT INTO fingerprints (id, track_id, signature, signature_bits)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    reference.to_string(),
                    fingerprint.track.to_string(),
                    pack_bits(&fingerprint.signature),
                    bits,
                ],
            )?;
            Ok(())
        })?;

        fingerprint.reference = Some(reference);
        log::debug!("Inserted fingerprint {} for track {}", reference, fingerprint.track);
        Ok(reference)
    }

    pub fn read_by_track(&self, track: TrackRef) -> Result<Vec<FingerprintData>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, track_id, signature, signature_bits
                 FROM fingerprints
                 WHERE track_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([track.to_string()], |row| {
                    Ok((
                        ref_column::<FingerprintRef>(row, 0)?,
                        ref_column::<TrackRef>(row, 1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(reference, track, packed, bits)| {
                    let bits = usize::try_from(bits).map_err(|_| {
                        Error::InvalidData(format!("fingerprint {reference} has {bits} bits"))
                    })?;
                    Ok(FingerprintData {
                        reference: Some(reference),
                        track,
                        signature: unpack_bits(&packed, bits)?,
                    })
                })
                .collect()
        })
    }
}

pub(crate) fn delete_for_track(conn: &Connection, track: TrackRef) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM fingerprints WHERE track_id = ?1",
        [track.to_string()],
    )?;
    Ok(removed)
}
