use serde::{Deserialize, Serialize};

use crate::model::hashed::HashedFingerprint;
use crate::model::ids::{SubFingerprintRef, TrackRef};

/// A persisted sub-fingerprint: one hashed window of a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubFingerprintRecord {
    pub reference: SubFingerprintRef,
    pub track: TrackRef,
    pub signature: Vec<u8>,
    pub hash_bins: Vec<i64>,
    pub sequence_number: u32,
    pub timestamp: f64,

    /// Group id of the owning track, filled in by similarity queries.
    pub group_id: Option<String>,
}

impl SubFingerprintRecord {
    /// Convert back into the generator-side representation.
    #[must_use]
    pub fn to_hashed(&self) -> HashedFingerprint {
        HashedFingerprint::new(
            self.signature.clone(),
            self.hash_bins.clone(),
            self.sequence_number,
            self.timestamp,
        )
    }
}

impl From<SubFingerprintRecord> for HashedFingerprint {
    fn from(record: SubFingerprintRecord) -> Self {
        Self::new(
            record.signature,
            record.hash_bins,
            record.sequence_number,
            record.timestamp,
        )
    }
}
