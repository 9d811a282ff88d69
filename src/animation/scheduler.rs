//! Frame scheduler for animated sources.
//!
//! The scheduler is a small state machine that owns the next scheduled tick. It never sleeps
//! itself: the loop driving the binding waits until [`AnimationScheduler::next_tick`] and then
//! calls [`AnimationScheduler::on_tick`] with the tick id it waited for. Cancelling a tick only
//! means forgetting it, and a tick that fires with an outdated id is ignored.

use crate::animation::{Animation, FrameIterator};
use crate::render::RenderCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Playback state of the scheduler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// No animation, the animation ended, or it was stopped on request
    #[default]
    Stopped,
    /// Frames are advancing, a tick is scheduled
    Running,
    /// Would be running but the surface is unmapped or unfocused
    Paused,
}

/// A tick the driving loop should deliver at `at`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScheduledTick {
    pub id: u64,
    pub at: Instant,
}

/// Applies the frame rate cap: the reported delay is never shortened, only raised to `floor`.
/// `None` (no further frame) passes through.
pub fn clamp_delay(reported: Option<Duration>, floor: Duration) -> Option<Duration> {
    reported.map(|d| d.max(floor))
}

/// Playback time, excluding paused intervals.
#[derive(Debug, Default)]
struct PlayClock {
    played: Duration,
    since: Option<Instant>,
}

impl PlayClock {
    fn elapsed(&self, now: Instant) -> Duration {
        match self.since {
            Some(since) => self.played + now.saturating_duration_since(since),
            None => self.played,
        }
    }

    fn resume(&mut self, now: Instant) {
        if self.since.is_none() {
            self.since = Some(now);
        }
    }

    /// Stops the clock and rewinds it to `position`.
    fn pause_at(&mut self, position: Duration) {
        self.played = position;
        self.since = None;
    }
}

pub struct AnimationScheduler {
    /// floor(1000 / max_fps)
    min_delay: Duration,
    animation: Option<Arc<dyn Animation>>,
    iter: Option<Box<dyn FrameIterator>>,
    state: AnimationState,
    /// Surface unmapped or unfocused
    paused: bool,
    /// Stopped on request, independent of visibility
    held: bool,
    /// The iterator reported no further frame
    ended: bool,
    clock: PlayClock,
    /// Playback time the iterator was last advanced to
    position: Duration,
    tick: Option<ScheduledTick>,
    tick_seq: u64,
}

impl AnimationScheduler {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            animation: None,
            iter: None,
            state: AnimationState::Stopped,
            paused: true,
            held: false,
            ended: false,
            clock: PlayClock::default(),
            position: Duration::ZERO,
            tick: None,
            tick_seq: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    #[inline]
    pub fn next_tick(&self) -> Option<ScheduledTick> {
        self.tick
    }

    pub fn has_animation(&self) -> bool {
        self.animation.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Replaces the animation. Whatever ran before is stopped first.
    pub fn install(&mut self, animation: Arc<dyn Animation>, now: Instant, cache: &mut RenderCache) {
        self.clear();
        self.iter = Some(animation.iter());
        self.animation = Some(animation);
        self.held = false;
        self.try_start(now, cache);
    }

    /// Stops and drops the animation. The cache is left to the caller.
    pub fn clear(&mut self) {
        self.cancel_tick();
        self.animation = None;
        self.iter = None;
        self.ended = false;
        self.clock = PlayClock::default();
        self.position = Duration::ZERO;
        self.state = AnimationState::Stopped;
    }

    /// Pauses or resumes on visibility/focus changes.
    pub fn set_paused(&mut self, paused: bool, now: Instant, cache: &mut RenderCache) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;

        if paused {
            if self.state == AnimationState::Running {
                self.halt(cache);
                self.state = AnimationState::Paused;
            }
        } else if self.state == AnimationState::Paused {
            self.run(now, cache);
        }
    }

    /// Starts the animation on request, restarting it from the first frame if it already ended.
    pub fn start(&mut self, now: Instant, cache: &mut RenderCache) {
        self.held = false;
        if self.ended {
            if let Some(animation) = &self.animation {
                self.iter = Some(animation.iter());
            }
            self.ended = false;
            self.clock = PlayClock::default();
            self.position = Duration::ZERO;
        }
        if self.state == AnimationState::Stopped {
            self.try_start(now, cache);
        }
    }

    /// Stops the animation on request. It stays on its current frame until [`Self::start`].
    pub fn stop(&mut self, cache: &mut RenderCache) {
        self.held = true;
        if self.state == AnimationState::Running {
            self.halt(cache);
        }
        self.state = AnimationState::Stopped;
    }

    /// Delivers a tick. Returns false when the tick was outdated and ignored.
    pub fn on_tick(&mut self, id: u64, now: Instant, cache: &mut RenderCache) -> bool {
        if self.state != AnimationState::Running || self.tick.map(|t| t.id) != Some(id) {
            log::trace!("ignoring outdated animation tick {id}");
            return false;
        }
        self.tick = None;

        let elapsed = self.clock.elapsed(now);
        if let Some(iter) = self.iter.as_mut() {
            if iter.advance(elapsed) {
                cache.set_from_frame(Some(iter.frame()));
            }
        }
        self.position = elapsed;
        self.schedule_next(now);
        true
    }

    /// Cancels any pending tick unconditionally. Used on teardown.
    pub fn shutdown(&mut self) {
        self.clear();
    }

    fn try_start(&mut self, now: Instant, cache: &mut RenderCache) {
        if self.animation.is_none() || self.ended || self.held {
            self.state = AnimationState::Stopped;
        } else if self.paused {
            self.state = AnimationState::Paused;
        } else {
            self.run(now, cache);
        }
    }

    fn run(&mut self, now: Instant, cache: &mut RenderCache) {
        let Some(iter) = self.iter.as_ref() else {
            self.state = AnimationState::Stopped;
            return;
        };

        // Kickstart, so the surface never shows a blank frame while waiting for the first tick
        cache.set_from_frame(Some(iter.frame()));
        self.state = AnimationState::Running;
        self.clock.resume(now);
        self.schedule_next(now);
    }

    /// Cancels the pending tick and reapplies the current frame.
    fn halt(&mut self, cache: &mut RenderCache) {
        self.cancel_tick();
        self.clock.pause_at(self.position);
        if let Some(iter) = self.iter.as_ref() {
            cache.set_from_frame(Some(iter.frame()));
        }
    }

    fn schedule_next(&mut self, now: Instant) {
        let reported = self.iter.as_ref().and_then(|iter| iter.delay());
        match clamp_delay(reported, self.min_delay) {
            Some(delay) => {
                self.tick_seq += 1;
                self.tick = Some(ScheduledTick { id: self.tick_seq, at: now + delay });
            }
            None => {
                log::trace!("animation reached its end");
                self.tick = None;
                self.ended = true;
                self.state = AnimationState::Stopped;
            }
        }
    }

    fn cancel_tick(&mut self) {
        self.tick = None;
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        self.cancel_tick();
    }
}
