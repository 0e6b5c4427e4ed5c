//! Fingerprint storage for soundprint.
//!
//! Persists tracks, coarse fingerprints, sub-fingerprints and spectral
//! images, and maintains the 25-table hash-bin index used to answer
//! threshold-vote similarity queries. [`ModelService`] ties the stores
//! together and owns the track delete cascade.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod fingerprint;
pub mod hash_bins;
pub mod service;
pub mod spectral;
pub mod sub_fingerprint;
pub mod track;

pub use config::Config;
pub use fingerprint::FingerprintStore;
pub use hash_bins::BucketIndex;
pub use service::ModelService;
pub use spectral::SpectralImageStore;
pub use sub_fingerprint::{BatchFailure, BatchInsertReport, SubFingerprintStore};
pub use track::{DeleteSummary, TrackStore};

pub use soundprint_core::model::{
    FingerprintData, FingerprintRef, HashedFingerprint, SpectralImage, SpectralImageRef,
    SubFingerprintRecord, SubFingerprintRef, TrackRecord, TrackRef, HASH_TABLE_COUNT,
};
pub use soundprint_core::{Error, Result};
