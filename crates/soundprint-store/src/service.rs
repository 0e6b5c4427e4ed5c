use std::sync::Arc;

use soundprint_core::model::{
    FingerprintData, FingerprintRef, HashedFingerprint, RandomReferences, ReferenceAllocator,
    SpectralImage, SpectralImageRef, SubFingerprintRecord, SubFingerprintRef, TrackRecord, TrackRef,
};
use soundprint_core::schema::Database;
use soundprint_core::Result;

use crate::config::Config;
use crate::fingerprint::FingerprintStore;
use crate::hash_bins::BucketIndex;
use crate::spectral::SpectralImageStore;
use crate::sub_fingerprint::{BatchInsertReport, SubFingerprintStore};
use crate::track::{DeleteSummary, TrackStore};

/// Single entry point over all stores.
///
/// The service is `Send + Sync`; share it behind an `Arc` between
/// fingerprinting workers and query handlers.
#[derive(Debug, Clone)]
pub struct ModelService {
    db: Arc<Database>,
    tracks: TrackStore,
    sub_fingerprints: SubFingerprintStore,
    fingerprints: FingerprintStore,
    spectral_images: SpectralImageStore,
}

impl ModelService {
    /// Build a service over `db` that allocates random references.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self::with_allocator(db, Arc::new(RandomReferences))
    }

    #[must_use]
    pub fn with_allocator(db: Database, allocator: Arc<dyn ReferenceAllocator>) -> Self {
        let db = Arc::new(db);
        Self {
            tracks: TrackStore::new(Arc::clone(&db), Arc::clone(&allocator)),
            sub_fingerprints: SubFingerprintStore::new(Arc::clone(&db), Arc::clone(&allocator)),
            fingerprints: FingerprintStore::new(Arc::clone(&db), Arc::clone(&allocator)),
            spectral_images: SpectralImageStore::new(Arc::clone(&db), allocator),
            db,
        }
    }

    /// Open the database named by `config` (creating its directory) and
    /// build a service over it.
    pub fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open_with_timeout(&config.database_path, config.busy_timeout())?;
        Ok(Self::new(db))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// The shared database handle (for advanced queries).
    #[must_use]
    pub const fn database(&self) -> &Arc<Database> {
        &self.db
    }

    #[must_use]
    pub const fn bucket_index(&self) -> &BucketIndex {
        self.sub_fingerprints.index()
    }
}

// Tracks
impl ModelService {
    pub fn insert_track(&self, track: &mut TrackRecord) -> Result<TrackRef> {
        self.tracks.insert(track)
    }

    pub fn read_track_by_reference(&self, reference: TrackRef) -> Result<Option<TrackRecord>> {
        self.tracks.read_by_reference(reference)
    }

    pub fn read_track_by_isrc(&self, isrc: &str) -> Result<Option<TrackRecord>> {
        self.tracks.read_by_external_id(isrc)
    }

    pub fn read_tracks_by_artist_and_title(&self, artist: &str, title: &str) -> Result<Vec<TrackRecord>> {
        self.tracks.read_by_artist_and_title(artist, title)
    }

    pub fn read_all_tracks(&self) -> Result<Vec<TrackRecord>> {
        self.tracks.read_all()
    }

    /// Whether a track with this ISRC, or with this artist and title, exists.
    pub fn contains_track(&self, isrc: &str, artist: &str, title: &str) -> Result<bool> {
        if self.tracks.read_by_external_id(isrc)?.is_some() {
            return Ok(true);
        }
        Ok(!self.tracks.read_by_artist_and_title(artist, title)?.is_empty())
    }

    /// Delete a track and everything it owns; see [`TrackStore::delete`].
    pub fn delete_track(&self, reference: TrackRef) -> Result<DeleteSummary> {
        self.tracks.delete(reference)
    }
}

// Hash data
impl ModelService {
    pub fn insert_hash_data_for_track(
        &self,
        hashed: &[HashedFingerprint],
        track: TrackRef,
    ) -> Result<BatchInsertReport> {
        self.sub_fingerprints.insert_batch(hashed, track)
    }

    /// Hashed fingerprints stored for `track`, ordered by sequence number.
    pub fn read_hashed_fingerprints_by_track(&self, track: TrackRef) -> Result<Vec<HashedFingerprint>> {
        Ok(self
            .sub_fingerprints
            .read_by_track(track)?
            .into_iter()
            .map(HashedFingerprint::from)
            .collect())
    }

    pub fn read_sub_fingerprint(&self, reference: SubFingerprintRef) -> Result<Option<SubFingerprintRecord>> {
        self.sub_fingerprints.read_by_reference(reference)
    }

    pub fn read_sub_fingerprints_with_threshold(
        &self,
        hash_bins: &[i64],
        threshold: u32,
    ) -> Result<Vec<SubFingerprintRecord>> {
        self.sub_fingerprints.query_by_threshold(hash_bins, threshold, None)
    }

    /// Like [`ModelService::read_sub_fingerprints_with_threshold`], limited
    /// to tracks in `group_id`.
    pub fn read_sub_fingerprints_with_threshold_in_group(
        &self,
        hash_bins: &[i64],
        threshold: u32,
        group_id: &str,
    ) -> Result<Vec<SubFingerprintRecord>> {
        self.sub_fingerprints
            .query_by_threshold(hash_bins, threshold, Some(group_id))
    }
}

// Fingerprints and spectral images
impl ModelService {
    pub fn insert_fingerprint(&self, fingerprint: &mut FingerprintData) -> Result<FingerprintRef> {
        self.fingerprints.insert(fingerprint)
    }

    pub fn read_fingerprints_by_track(&self, track: TrackRef) -> Result<Vec<FingerprintData>> {
        self.fingerprints.read_by_track(track)
    }

    pub fn insert_spectral_images(&self, images: &[Vec<f32>], track: TrackRef) -> Result<Vec<SpectralImageRef>> {
        self.spectral_images.insert(images, track)
    }

    pub fn read_spectral_images_by_track(&self, track: TrackRef) -> Result<Vec<SpectralImage>> {
        self.spectral_images.read_by_track(track)
    }
}
