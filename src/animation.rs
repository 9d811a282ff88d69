//! Animated sources and their frame scheduler.

mod frames;
mod scheduler;

pub use frames::{Animation, AnimationFrame, FrameIterator, FrameSequence, LoopCount};
pub use scheduler::{clamp_delay, AnimationScheduler, AnimationState, ScheduledTick};
