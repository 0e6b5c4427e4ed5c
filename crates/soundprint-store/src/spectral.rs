use rusqlite::Connection;
use std::sync::Arc;

use soundprint_core::model::{ReferenceAllocator, SpectralImage, SpectralImageRef, TrackRef};
use soundprint_core::schema::{ref_column, Database};
use soundprint_core::{Error, Result};

use crate::track::require as require_track;

/// Spectral images of a track, stored in order.
#[derive(Debug, Clone)]
pub struct SpectralImageStore {
    db: Arc<Database>,
    allocator: Arc<dyn ReferenceAllocator>,
}

impl SpectralImageStore {
    #[must_use]
    pub fn new(db: Arc<Database>, allocator: Arc<dyn ReferenceAllocator>) -> Self {
        Self { db, allocator }
    }

    /// Store `images` for `track`; the n-th image gets order number n.
    ///
    /// All images are written in one transaction.
    pub fn insert(&self, images: &[Vec<f32>], track: TrackRef) -> Result<Vec<SpectralImageRef>> {
        let references = images
            .iter()
            .map(|_| SpectralImageRef::allocate(self.allocator.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        self.db.with_transaction(|tx| {
            require_track(tx, track)?;
            let mut stmt = tx.prepare_cached(
                "INSERT INTO spectral_images (id, track_id, order_number, image)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for ((order_number, image), reference) in (0_u32..).zip(images).zip(&references) {
                stmt.execute(rusqlite::params![
                    reference.to_string(),
                    track.to_string(),
                    order_number,
                    encode_image(image),
                ])?;
            }
            Ok(())
        })?;

        log::debug!("Inserted {} spectral images for track {}", references.len(), track);
        Ok(references)
    }

    /// Images of `track` ordered by order number.
    pub fn read_by_track(&self, track: TrackRef) -> Result<Vec<SpectralImage>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, track_id, order_number, image
                 FROM spectral_images
                 WHERE track_id = ?1
                 ORDER BY order_number",
            )?;
            let rows = stmt
                .query_map([track.to_string()], |row| {
                    Ok((
                        ref_column::<SpectralImageRef>(row, 0)?,
                        ref_column::<TrackRef>(row, 1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(reference, track, order_number, bytes)| {
                    Ok(SpectralImage {
                        reference,
                        track,
                        order_number,
                        image: decode_image(&bytes)?,
                    })
                })
                .collect()
        })
    }
}

pub(crate) fn delete_for_track(conn: &Connection, track: TrackRef) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM spectral_images WHERE track_id = ?1",
        [track.to_string()],
    )?;
    Ok(removed)
}

fn encode_image(image: &[f32]) -> Vec<u8> {
    image.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn decode_image(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::InvalidData(format!(
            "spectral image of {} bytes is not a whole number of f32 values",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackStore;
    use soundprint_core::model::{RandomReferences, TrackRecord};

    #[test]
    fn test_images_round_trip_in_order() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let allocator: Arc<dyn ReferenceAllocator> = Arc::new(RandomReferences);
        let tracks = TrackStore::new(Arc::clone(&db), Arc::clone(&allocator));
        let images = SpectralImageStore::new(db, allocator);

        let mut track = TrackRecord::new("isrc", "artist", "title", "album", 1986, 200.0);
        let track_ref = tracks.insert(&mut track).unwrap();

        let frames = vec![vec![0.5_f32, -1.25, 3.0], vec![], vec![f32::MAX]];
        let references = images.insert(&frames, track_ref).unwrap();
        assert_eq!(references.len(), 3);

        let read = images.read_by_track(track_ref).unwrap();
        let orders: Vec<u32> = read.iter().map(|image| image.order_number).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(read[0].image, frames[0]);
        assert_eq!(read[2].reference, references[2]);
    }

    #[test]
    fn test_decode_rejects_ragged_bytes() {
        assert!(decode_image(&[0, 1, 2]).is_err());
        assert_eq!(decode_image(&encode_image(&[1.5])).unwrap(), vec![1.5]);
    }
}
