//! Scaled-frame cache.
//!
//! A [`RenderCache`] holds the source frame a binding currently displays and one scaled
//! derivative of it. The derivative is keyed by a [`CacheKey`]; it is recomputed lazily on the
//! next [`RenderCache::paint`] once the cache was invalidated or the key no longer matches.

use crate::render::{Frame, FrameId, Surface, SurfaceSize};
use std::sync::Arc;

/// Everything the scaled frame depends on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Identity of the source frame
    pub frame: FrameId,
    /// Logical width the frame was scaled for (0 when the natural size was used)
    pub width: u32,
    /// Logical height the frame was scaled for (0 when the natural size was used)
    pub height: u32,
    /// Display scale factor
    pub scale: u32,
}

#[derive(Default)]
pub struct RenderCache {
    /// Frame as delivered by the provider or the animation
    source: Option<Arc<Frame>>,
    /// Scaled derivative and the key it was produced for
    scaled: Option<(CacheKey, Arc<Frame>)>,
    /// Set by invalidate(), forces recomputation on the next paint
    stale: bool,
    /// Set whenever the displayed content may have changed, cleared by take_damage()
    damage: bool,
    /// Sources larger than this are displayed unscaled
    scale_limit: Option<SurfaceSize>,
    /// Number of times the scaling primitive was called
    recomputes: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the scaled frame stale.
    pub fn invalidate(&mut self) {
        self.stale = true;
        self.damage = true;
    }

    /// Installs a new source frame (or clears it) and invalidates.
    pub fn set_from_frame(&mut self, frame: Option<Arc<Frame>>) {
        self.source = frame;
        self.invalidate();
    }

    /// Limits scaling to sources that fit within `limit`. Used for animated sources.
    pub fn set_scale_limit(&mut self, limit: Option<SurfaceSize>) {
        if self.scale_limit != limit {
            self.scale_limit = limit;
            self.invalidate();
        }
    }

    #[inline]
    pub fn source(&self) -> Option<&Arc<Frame>> {
        self.source.as_ref()
    }

    #[inline]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Returns true once per change of the displayed content.
    pub fn take_damage(&mut self) -> bool {
        std::mem::take(&mut self.damage)
    }

    #[inline]
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Returns the frame to display on `surface`, scaling the source if needed.
    pub fn paint(&mut self, surface: &dyn Surface) -> Option<Arc<Frame>> {
        let Some(source) = self.source.clone() else {
            self.scaled = None;
            self.stale = false;
            return None;
        };

        let geometry = surface.geometry();
        let logical = geometry.logical_size().unwrap_or_default();
        let key = CacheKey {
            frame: source.id(),
            width: logical.width,
            height: logical.height,
            scale: geometry.scale_factor.max(1),
        };

        if !self.stale {
            if let Some((cached_key, frame)) = &self.scaled {
                if *cached_key == key {
                    return Some(frame.clone());
                }
            }
        }

        let target = geometry.target_size(source.size());
        let unscalable = self.scale_limit.is_some_and(|limit| source.size().exceeds(limit));

        let frame = if unscalable || target == source.size() || target.is_empty() {
            source
        } else {
            self.recomputes += 1;
            Arc::new(surface.scale(&source, target.width, target.height))
        };

        self.scaled = Some((key, frame.clone()));
        self.stale = false;
        Some(frame)
    }
}
