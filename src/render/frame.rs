use crate::render::SurfaceSize;
use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a decoded or scaled frame.
///
/// Two frames with the same pixels but created separately have different ids. The render cache
/// keys on this id, so it never has to compare pixel data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl FrameId {
    fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A single RGBA8 raster ready for display.
pub struct Frame {
    id: FrameId,
    image: RgbaImage,
}

impl Frame {
    /// Wraps the image and assigns it a fresh [`FrameId`].
    pub fn new(image: RgbaImage) -> Self {
        Self { id: FrameId::next(), image }
    }

    /// Creates a frame filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    #[inline]
    pub fn id(&self) -> FrameId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize { width: self.width(), height: self.height() }
    }

    /// Raw pixels, row-major RGBA8 without padding.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_frame_gets_its_own_id() {
        let a = Frame::solid(2, 2, [255, 0, 0, 255]);
        let b = Frame::solid(2, 2, [255, 0, 0, 255]);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn size_matches_image() {
        let f = Frame::solid(3, 5, [0, 0, 0, 0]);
        assert_eq!(f.size(), SurfaceSize { width: 3, height: 5 });
        assert_eq!(f.pixels().len(), 3 * 5 * 4);
    }
}
