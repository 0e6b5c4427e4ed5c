use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ids::{FingerprintRef, TrackRef};

/// A coarse, fixed-length bit signature of a track.
///
/// Stored as-is and looked up only by owning track; it is not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintData {
    pub reference: Option<FingerprintRef>,
    pub track: TrackRef,
    pub signature: Vec<bool>,
}

impl FingerprintData {
    #[must_use]
    pub fn new(signature: Vec<bool>, track: TrackRef) -> Self {
        Self {
            reference: None,
            track,
            signature,
        }
    }
}

/// Pack bits MSB-first into bytes; the final byte is zero-padded.
#[must_use]
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
        bytes[i / 8] |= 0x80 >> (i % 8);
    }
    bytes
}

/// Inverse of [`pack_bits`] for a signature of `len` bits.
pub fn unpack_bits(bytes: &[u8], len: usize) -> Result<Vec<bool>> {
    if bytes.len() != len.div_ceil(8) {
        return Err(Error::InvalidData(format!(
            "{} packed bytes cannot hold exactly {len} bits",
            bytes.len()
        )));
    }
    Ok((0..len)
        .map(|i| bytes[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_bits_msb_first() {
        let bits = [true, false, true, false, false, false, false, true, true];
        assert_eq!(pack_bits(&bits), vec![0b1010_0001, 0b1000_0000]);
    }

    #[test]
    fn test_unpack_restores_bits() {
        let bits: Vec<bool> = (0..13).map(|i| i % 3 == 0).collect();
        let packed = pack_bits(&bits);
        assert_eq!(unpack_bits(&packed, bits.len()).unwrap(), bits);
    }

    #[test]
    fn test_unpack_length_mismatch() {
        assert!(unpack_bits(&[0xff], 9).is_err());
    }

    #[test]
    fn test_empty_signature_packs_to_nothing() {
        assert!(pack_bits(&[]).is_empty());
        assert!(unpack_bits(&[], 0).unwrap().is_empty());
    }
}
