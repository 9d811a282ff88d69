//! The surface an image binding paints onto.
//!
//! The host toolkit owns the widget. It reports the widget's geometry, accepts redraw requests and
//! provides the scaling primitive. Everything else in this crate only talks to the widget through
//! the [`Surface`] trait.

use crate::render::Frame;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when either dimension is larger than `limit`.
    pub fn exceeds(&self, limit: SurfaceSize) -> bool {
        self.width > limit.width || self.height > limit.height
    }
}

/// Geometry of a surface as reported by the host at a given moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Size the widget asked for, if any
    pub requested: Option<SurfaceSize>,
    /// Size the widget was given by layout (zero before the first allocation)
    pub allocated: SurfaceSize,
    /// Integer display scale factor (1 on regular displays, 2 on HiDPI)
    pub scale_factor: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            requested: None,
            allocated: SurfaceSize::default(),
            scale_factor: 1,
        }
    }
}

impl Geometry {
    pub fn new(width: u32, height: u32, scale_factor: u32) -> Self {
        Self {
            requested: None,
            allocated: SurfaceSize::new(width, height),
            scale_factor,
        }
    }

    /// Logical size to paint at: the allocation once layout ran, the requested size before that.
    pub fn logical_size(&self) -> Option<SurfaceSize> {
        if !self.allocated.is_empty() {
            return Some(self.allocated);
        }
        self.requested.filter(|s| !s.is_empty())
    }

    /// Device pixel size for a frame of `natural` size. Falls back to the natural size when the
    /// surface has no usable size yet.
    pub fn target_size(&self, natural: SurfaceSize) -> SurfaceSize {
        let scale = self.scale_factor.max(1);
        match self.logical_size() {
            Some(s) => SurfaceSize::new(s.width.saturating_mul(scale), s.height.saturating_mul(scale)),
            None => natural,
        }
    }
}

/// Host widget interface. Calls occur on the loop that drives the binding.
pub trait Surface: Send + Sync {
    /// Current geometry. Read at paint time, never cached by the caller.
    fn geometry(&self) -> Geometry;

    /// Ask the host to repaint the widget. The host eventually calls the binding's paint path.
    fn queue_draw(&self) {}

    /// Scale `frame` to exactly `width` x `height` device pixels.
    fn scale(&self, frame: &Frame, width: u32, height: u32) -> Frame {
        scale_frame(frame, width, height)
    }
}

/// Default CPU scaling primitive.
pub fn scale_frame(frame: &Frame, width: u32, height: u32) -> Frame {
    Frame::new(imageops::resize(frame.image(), width.max(1), height.max(1), FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_wins_over_request() {
        let g = Geometry {
            requested: Some(SurfaceSize::new(10, 10)),
            allocated: SurfaceSize::new(32, 16),
            scale_factor: 2,
        };
        assert_eq!(g.target_size(SurfaceSize::new(1, 1)), SurfaceSize::new(64, 32));
    }

    #[test]
    fn request_is_used_before_layout() {
        let g = Geometry {
            requested: Some(SurfaceSize::new(24, 24)),
            allocated: SurfaceSize::default(),
            scale_factor: 1,
        };
        assert_eq!(g.target_size(SurfaceSize::new(100, 50)), SurfaceSize::new(24, 24));
    }

    #[test]
    fn natural_size_without_any_geometry() {
        let g = Geometry::default();
        assert_eq!(g.target_size(SurfaceSize::new(100, 50)), SurfaceSize::new(100, 50));
    }

    #[test]
    fn default_scaler_produces_requested_size() {
        let f = Frame::solid(8, 8, [10, 20, 30, 255]);
        let s = scale_frame(&f, 4, 2);
        assert_eq!(s.size(), SurfaceSize::new(4, 2));
        assert_ne!(s.id(), f.id());
    }
}
