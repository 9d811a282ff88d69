//! Frames, the surface interface and the scaled-frame cache.

mod cache;
mod frame;
mod surface;

pub use cache::{CacheKey, RenderCache};
pub use frame::{Frame, FrameId};
pub use surface::{scale_frame, Geometry, Surface, SurfaceSize};
