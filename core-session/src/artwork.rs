//! Artwork thumbnailing for notification and lock-screen surfaces.
//!
//! Platforms want a square bitmap of a fixed edge. Source artwork is decoded,
//! center-cropped to a square (aspect preserved, no letterboxing), resized
//! with Lanczos3 and emitted as RGBA8.

use bridge_traits::Thumbnail;
use bytes::Bytes;
use image::imageops::FilterType;
use tracing::trace;

use crate::error::{Result, SessionError};

/// Scale encoded artwork to a `size` x `size` RGBA thumbnail.
pub fn scale_artwork(data: &[u8], size: u32) -> Result<Thumbnail> {
    if size == 0 {
        return Err(SessionError::Artwork(
            "thumbnail size must be greater than 0".to_string(),
        ));
    }

    let img = image::load_from_memory(data)
        .map_err(|e| SessionError::Artwork(format!("Failed to load image: {}", e)))?;

    let rgba = img.resize_to_fill(size, size, FilterType::Lanczos3).to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Thumbnail {
        width,
        height,
        rgba: Bytes::from(rgba.into_raw()),
    })
}

/// Thumbnail scaler that remembers the last artwork it scaled.
///
/// Snapshots arrive several times a second while the track is unchanged, so
/// a single-entry cache keyed on the encoded bytes avoids rescaling.
#[derive(Debug)]
pub struct ArtworkScaler {
    size: u32,
    last: Option<(Bytes, Thumbnail)>,
}

impl ArtworkScaler {
    pub fn new(size: u32) -> Self {
        Self { size, last: None }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Cache misses are decoded and scaled on the blocking pool so the
    /// caller's task keeps serving other work meanwhile.
    pub async fn thumbnail(&mut self, artwork: &Bytes) -> Result<Thumbnail> {
        if let Some((source, thumbnail)) = &self.last {
            if source == artwork {
                trace!("Artwork thumbnail cache hit");
                return Ok(thumbnail.clone());
            }
        }

        let source = artwork.clone();
        let size = self.size;
        let thumbnail = tokio::task::spawn_blocking(move || scale_artwork(&source, size))
            .await
            .map_err(|e| SessionError::Artwork(format!("Scaling task failed: {}", e)))??;
        self.last = Some((artwork.clone(), thumbnail.clone()));
        Ok(thumbnail)
    }
}
