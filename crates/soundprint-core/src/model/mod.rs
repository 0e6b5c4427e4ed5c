pub mod fingerprint;
pub mod hashed;
pub mod ids;
pub mod spectral;
pub mod sub_fingerprint;
pub mod track;

pub use fingerprint::FingerprintData;
pub use hashed::{check_hash_bins, HashedFingerprint, HASH_TABLE_COUNT};
pub use ids::{
    FingerprintRef, RandomReferences, ReferenceAllocator, SequentialReferences, SpectralImageRef,
    SubFingerprintRef, TrackRef,
};
pub use spectral::SpectralImage;
pub use sub_fingerprint::SubFingerprintRecord;
pub use track::TrackRecord;
