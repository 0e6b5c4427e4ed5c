use serde::{Deserialize, Serialize};

use crate::model::ids::{SpectralImageRef, TrackRef};

/// One spectral image (a frame of log-spectrum magnitudes) of a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralImage {
    pub reference: SpectralImageRef,
    pub track: TrackRef,

    /// Position of the image within the track, starting at zero.
    pub order_number: u32,

    pub image: Vec<f32>,
}
