//! Image binding: [`ImageBinding`], [`BindingId`] and the worker that can drive it.
//!
//! A binding attaches one identifier to one surface. It owns the visibility gate, the fetch
//! controller, the render cache and the animation scheduler, and is the only place where their
//! state is mutated. Everything arrives as a method call on the binding: host notifications
//! (map, unmap, focus, geometry) directly, asynchronous results through [`ImageBinding::next_event`]
//! followed by [`ImageBinding::handle_event`].

mod commands;
mod handle;
mod worker;

pub use commands::BindingCommand;
pub use handle::BindingHandle;
pub use worker::BindingWorker;

use crate::animation::{AnimationScheduler, AnimationState, ScheduledTick};
use crate::config::BindingConfig;
use crate::fetch::{Accepted, Delivery, FetchController, FetchOutcome};
use crate::provider::{DecodedSource, ResourceProvider};
use crate::render::{Frame, RenderCache, Surface};
use crate::report::{ErrorReport, ErrorSink, LogErrorSink};
use crate::visibility::{Transition, VisibilityGate};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A unique identifier for a binding, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(Uuid);

impl BindingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that happened off the host's call path and must be applied on the loop.
#[derive(Debug)]
pub enum BindingEvent {
    /// A fetch completed, successfully or not
    Delivered(Delivery),
    /// The scheduled animation tick with this id is due
    Tick(u64),
    /// The bound focus scope changed
    FocusChanged(bool),
    /// The bound focus scope went away
    FocusScopeClosed,
}

pub struct ImageBinding {
    id: BindingId,
    config: BindingConfig,
    surface: Arc<dyn Surface>,
    sink: Arc<dyn ErrorSink>,
    gate: VisibilityGate,
    fetch: FetchController,
    cache: RenderCache,
    scheduler: AnimationScheduler,
    /// Focus of the top-level, true when no scope is bound
    focused: bool,
    focus_scope: Option<watch::Receiver<bool>>,
    /// Damage was flushed since the last paint
    needs_repaint: bool,
}

impl ImageBinding {
    /// Creates an invisible binding without a source.
    pub fn new(config: BindingConfig, provider: Arc<dyn ResourceProvider>, surface: Arc<dyn Surface>) -> Self {
        let scheduler = AnimationScheduler::new(config.min_frame_delay());
        Self {
            id: BindingId::new(),
            config,
            surface,
            sink: Arc::new(LogErrorSink),
            gate: VisibilityGate::new(CancellationToken::new()),
            fetch: FetchController::new(provider),
            cache: RenderCache::new(),
            scheduler,
            focused: true,
            focus_scope: None,
            needs_repaint: false,
        }
    }

    /// Ties the binding to an outer lifetime, e.g. the window it lives in.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.gate = VisibilityGate::new(parent);
        self
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    #[inline]
    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn source(&self) -> &str {
        self.fetch.source()
    }

    /// Content of the current identifier was retrieved and applied.
    pub fn is_loaded(&self) -> bool {
        self.fetch.is_ok()
    }

    pub fn is_visible(&self) -> bool {
        self.gate.is_visible()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn visibility_epoch(&self) -> u64 {
        self.gate.epoch()
    }

    pub fn fetches_issued(&self) -> u64 {
        self.fetch.issued()
    }

    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint
    }

    pub fn animation_state(&self) -> AnimationState {
        self.scheduler.state()
    }

    /// Frame currently shown, before scaling.
    pub fn displayed_frame(&self) -> Option<Arc<Frame>> {
        self.cache.source().cloned()
    }

    /// Sets the identifier to display. An empty identifier clears the surface.
    pub fn set_source(&mut self, source: &str) {
        let ctx = self.gate.current();
        let Some(outcome) = self.fetch.set_source(source, &ctx) else {
            return;
        };
        log::debug!("Binding[{:?}]: source set to {:?} ({:?})", self.id, source, outcome);

        if source.is_empty() {
            self.clear_display();
        }
        self.flush_damage();
    }

    pub fn set_visible(&mut self, visible: bool) {
        match self.gate.set_visible(visible) {
            Transition::Renewed(ctx) => {
                log::trace!("Binding[{:?}]: visible, epoch {}", self.id, self.gate.epoch());
                self.cache.invalidate();
                // Loaded content survives the hidden interval, only unfinished work is retried
                if self.fetch.fetch(&ctx) == FetchOutcome::Cleared {
                    self.clear_display();
                }
            }
            Transition::Suspended => {
                log::trace!("Binding[{:?}]: hidden", self.id);
                self.fetch.cancel_inflight();
            }
            Transition::Unchanged => return,
        }
        self.update_pause();
        self.flush_damage();
    }

    pub fn on_map(&mut self) {
        self.set_visible(true);
    }

    pub fn on_unmap(&mut self) {
        self.set_visible(false);
    }

    pub fn set_focused(&mut self, focused: bool) {
        if self.focused == focused {
            return;
        }
        self.focused = focused;
        self.update_pause();
        self.flush_damage();
    }

    /// Subscribes to a top-level's focus flag, replacing any previous subscription. `None`
    /// unbinds and counts as focused.
    pub fn bind_focus_scope(&mut self, scope: Option<watch::Receiver<bool>>) {
        match scope {
            Some(mut rx) => {
                let focused = *rx.borrow_and_update();
                self.focus_scope = Some(rx);
                self.set_focused(focused);
            }
            None => {
                self.focus_scope = None;
                self.set_focused(true);
            }
        }
    }

    /// The surface was resized or moved to a display with another scale factor.
    pub fn notify_geometry_changed(&mut self) {
        self.cache.invalidate();
        self.flush_damage();
    }

    /// Starts a stopped animation, from the first frame if it already ended.
    pub fn start_animation(&mut self) {
        self.scheduler.start(Instant::now(), &mut self.cache);
        self.flush_damage();
    }

    /// Stops the animation on its current frame until [`Self::start_animation`].
    pub fn stop_animation(&mut self) {
        self.scheduler.stop(&mut self.cache);
        self.flush_damage();
    }

    /// Returns the frame to draw, scaled for the surface's current geometry.
    pub fn paint(&mut self) -> Option<Arc<Frame>> {
        self.needs_repaint = false;
        self.cache.paint(self.surface.as_ref())
    }

    /// Waits for the next delivery, focus change or animation tick. Cancel-safe.
    pub async fn next_event(&mut self) -> BindingEvent {
        let tick = self.scheduler.next_tick();

        tokio::select! {
            biased;
            delivery = self.fetch.next_delivery() => BindingEvent::Delivered(delivery),
            event = focus_changed(&mut self.focus_scope) => event,
            id = tick_at(tick) => BindingEvent::Tick(id),
        }
    }

    pub fn handle_event(&mut self, event: BindingEvent) {
        match event {
            BindingEvent::Delivered(delivery) => self.apply_delivery(delivery),
            BindingEvent::Tick(id) => {
                self.scheduler.on_tick(id, Instant::now(), &mut self.cache);
            }
            BindingEvent::FocusChanged(focused) => self.set_focused(focused),
            BindingEvent::FocusScopeClosed => {
                log::trace!("Binding[{:?}]: focus scope closed", self.id);
                self.bind_focus_scope(None);
            }
        }
        self.flush_damage();
    }

    /// Cancels all outstanding work. The binding stays usable but invisible.
    pub fn close(&mut self) {
        self.scheduler.shutdown();
        self.fetch.cancel_inflight();
        self.gate.close();
        self.focus_scope = None;
    }

    fn apply_delivery(&mut self, delivery: Delivery) {
        match self.fetch.accept(delivery) {
            Accepted::Fresh(decoded) => {
                log::debug!("Binding[{:?}]: loaded {:?}", self.id, self.fetch.source());
                self.apply_source(decoded);
            }
            Accepted::Failed { source, error } => {
                log::warn!("Binding[{:?}]: failed to load {:?}: {}", self.id, source, error);
                self.sink.report(ErrorReport { binding: self.id, source, error });
            }
            Accepted::Stale { source } => {
                log::trace!("Binding[{:?}]: dropping stale result for {:?}", self.id, source);
            }
        }
    }

    fn apply_source(&mut self, decoded: DecodedSource) {
        // Whatever animated before is stopped before its handle goes away
        self.scheduler.clear();

        match decoded {
            DecodedSource::Animated(animation) if self.config.animations_enabled => {
                self.cache.set_scale_limit(Some(self.config.anim_max_size));
                self.cache.set_from_frame(Some(animation.static_frame()));
                self.scheduler.install(animation, Instant::now(), &mut self.cache);
            }
            other => {
                self.cache.set_scale_limit(None);
                self.cache.set_from_frame(Some(other.display_frame()));
            }
        }
    }

    fn clear_display(&mut self) {
        self.scheduler.clear();
        self.cache.set_scale_limit(None);
        self.cache.set_from_frame(None);
    }

    /// Unmap wins over focus: animations only run when both hold.
    fn update_pause(&mut self) {
        let paused = !(self.gate.is_visible() && self.focused);
        self.scheduler.set_paused(paused, Instant::now(), &mut self.cache);
    }

    fn flush_damage(&mut self) {
        if self.cache.take_damage() {
            self.needs_repaint = true;
            self.surface.queue_draw();
        }
    }
}

impl Drop for ImageBinding {
    fn drop(&mut self) {
        self.close();
    }
}

async fn focus_changed(scope: &mut Option<watch::Receiver<bool>>) -> BindingEvent {
    match scope {
        Some(rx) => match rx.changed().await {
            Ok(()) => BindingEvent::FocusChanged(*rx.borrow_and_update()),
            Err(_) => BindingEvent::FocusScopeClosed,
        },
        None => futures::future::pending().await,
    }
}

async fn tick_at(tick: Option<ScheduledTick>) -> u64 {
    match tick {
        Some(tick) => {
            tokio::time::sleep_until(tick.at).await;
            tick.id
        }
        None => futures::future::pending().await,
    }
}
