/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Tracks (identity source of truth)
CREATE TABLE IF NOT EXISTS tracks (
    id TEXT PRIMARY KEY,
    isrc TEXT NOT NULL,
    artist TEXT NOT NULL,
    title TEXT NOT NULL,
    album TEXT NOT NULL,
    release_year INTEGER NOT NULL,
    duration_secs REAL NOT NULL,
    group_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_tracks_isrc ON tracks(isrc);
CREATE INDEX IF NOT EXISTS idx_tracks_artist_title ON tracks(artist, title);

-- Coarse per-track fingerprints (bit-packed, not indexed)
CREATE TABLE IF NOT EXISTS fingerprints (
    id TEXT PRIMARY KEY,
    track_id TEXT NOT NULL REFERENCES tracks(id),
    signature BLOB NOT NULL,
    signature_bits INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fingerprints_track_id ON fingerprints(track_id);

-- Sub-fingerprints (one hashed window each)
CREATE TABLE IF NOT EXISTS sub_fingerprints (
    id TEXT PRIMARY KEY,
    track_id TEXT NOT NULL REFERENCES tracks(id),
    signature BLOB NOT NULL,
    hash_bins TEXT NOT NULL,
    sequence_number INTEGER NOT NULL,
    timestamp REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sub_fingerprints_track_id ON sub_fingerprints(track_id);

-- Bucket index: one row per (hash table, bin) a sub-fingerprint falls into
CREATE TABLE IF NOT EXISTS hash_bins (
    hash_table INTEGER NOT NULL,
    hash_bin INTEGER NOT NULL,
    sub_fingerprint_id TEXT NOT NULL REFERENCES sub_fingerprints(id),
    PRIMARY KEY (hash_table, hash_bin, sub_fingerprint_id)
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_hash_bins_sub_fingerprint_id ON hash_bins(sub_fingerprint_id);
"#;

const MIGRATION_002: &str = r#"
-- Spectral images kept alongside fingerprints
CREATE TABLE IF NOT EXISTS spectral_images (
    id TEXT PRIMARY KEY,
    track_id TEXT NOT NULL REFERENCES tracks(id),
    order_number INTEGER NOT NULL,
    image BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_spectral_images_track_id ON spectral_images(track_id);
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "spectral_images",
        sql: MIGRATION_002,
    },
];
