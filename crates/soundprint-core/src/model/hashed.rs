use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of hash tables in the bucket index; every hashed fingerprint
/// carries exactly one bin per table.
pub const HASH_TABLE_COUNT: usize = 25;

/// A hashed fingerprint window as produced by the fingerprint generator.
///
/// Transient input to the store: it is persisted as a
/// [`SubFingerprintRecord`](crate::model::SubFingerprintRecord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashedFingerprint {
    /// Raw sub-fingerprint signature.
    pub signature: Vec<u8>,

    /// One bucket value per hash table, in table order.
    pub hash_bins: Vec<i64>,

    /// Temporal order of the window within its track.
    pub sequence_number: u32,

    /// Offset of the window from the start of the track, in seconds.
    pub timestamp: f64,
}

impl HashedFingerprint {
    #[must_use]
    pub fn new(signature: Vec<u8>, hash_bins: Vec<i64>, sequence_number: u32, timestamp: f64) -> Self {
        Self {
            signature,
            hash_bins,
            sequence_number,
            timestamp,
        }
    }

    /// Check the insertion preconditions: a non-empty signature and one bin
    /// per hash table.
    pub fn validate(&self) -> Result<()> {
        if self.signature.is_empty() {
            return Err(Error::EmptySignature);
        }
        check_hash_bins(&self.hash_bins)
    }
}

/// Reject bucket vectors whose length differs from [`HASH_TABLE_COUNT`].
pub fn check_hash_bins(hash_bins: &[i64]) -> Result<()> {
    if hash_bins.len() == HASH_TABLE_COUNT {
        Ok(())
    } else {
        Err(Error::BucketCount {
            expected: HASH_TABLE_COUNT,
            actual: hash_bins.len(),
        })
    }
}
