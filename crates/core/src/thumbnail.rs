//! Thumbnail service seam, requested image kinds, and pixel-count resizing.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::CoreError;
use crate::types::LocalId;

/// Decoded bitmap handed out by the thumbnail service.
pub type Bitmap = DynamicImage;

/// Target pixel count for micro thumbnails (128 x 128).
pub const MICRO_TARGET_PIXELS: u32 = 128 * 128;

// ---------------------------------------------------------------------------
// Requested image kinds
// ---------------------------------------------------------------------------

/// Size class a caller asks a media record for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    FullImage = 1,
    Thumbnail = 2,
    MicroThumbnail = 3,
}

impl TryFrom<i32> for ImageKind {
    type Error = CoreError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Self::FullImage),
            2 => Ok(Self::Thumbnail),
            3 => Ok(Self::MicroThumbnail),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown image kind {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Thumbnail service
// ---------------------------------------------------------------------------

/// Resolution tiers offered by the thumbnail service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailSize {
    /// Roughly 512 x 384.
    Mini = 1,
    FullScreen = 2,
    /// Roughly 96 x 96.
    Micro = 3,
}

/// Platform thumbnail service for indexed videos.
///
/// `get_thumbnail` may block on I/O and may generate the thumbnail as a
/// side effect. `None` means no thumbnail is available (yet).
pub trait ThumbnailProvider {
    fn get_thumbnail(&self, id: LocalId, size: ThumbnailSize) -> Option<Bitmap>;
    fn cancel_thumbnail_request(&self, id: LocalId);
}

// ---------------------------------------------------------------------------
// Resizing
// ---------------------------------------------------------------------------

/// Aspect-preserving downscale to an approximate total pixel count.
pub trait Resizer {
    fn resize(&self, bitmap: Bitmap, target_pixels: u32) -> Bitmap;
}

/// Default [`Resizer`] built on `image`'s triangle (bilinear) filter.
///
/// Bitmaps already at or below the target are returned untouched; this
/// resizer never upscales.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelCountResizer;

impl Resizer for PixelCountResizer {
    fn resize(&self, bitmap: Bitmap, target_pixels: u32) -> Bitmap {
        let (width, height) = (bitmap.width(), bitmap.height());
        let Some((new_width, new_height)) = scaled_dimensions(width, height, target_pixels) else {
            return bitmap;
        };
        tracing::trace!(width, height, new_width, new_height, "Resizing bitmap");
        bitmap.resize_exact(new_width, new_height, FilterType::Triangle)
    }
}

/// Dimensions scaled by `sqrt(target / (width * height))`, or `None` when
/// no downscale is needed.
pub fn scaled_dimensions(width: u32, height: u32, target_pixels: u32) -> Option<(u32, u32)> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels == 0 {
        return None;
    }
    let scale = (f64::from(target_pixels) / pixels as f64).sqrt();
    if scale >= 1.0 {
        return None;
    }
    let scale_dim = |dim: u32| ((f64::from(dim) * scale).round() as u32).max(1);
    Some((scale_dim(width), scale_dim(height)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
