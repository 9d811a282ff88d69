use crate::errors::ImageError;
use crate::render::Frame;
use std::fmt::Debug;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// A decoded multi-frame image.
pub trait Animation: Send + Sync + Debug {
    /// Frame to show when the animation does not play.
    fn static_frame(&self) -> Arc<Frame>;

    /// Returns a fresh iterator positioned at the first frame.
    fn iter(&self) -> Box<dyn FrameIterator>;
}

/// Cursor over the frames of an [`Animation`].
///
/// The iterator is driven by playback time: the total time the animation has actually been
/// playing, with paused intervals left out.
pub trait FrameIterator: Send {
    /// Frame at the current position.
    fn frame(&self) -> Arc<Frame>;

    /// How long the current frame still has to be shown, `None` when no further frame follows.
    fn delay(&self) -> Option<Duration>;

    /// Moves to the frame that should be showing at `elapsed` playback time. Returns true when
    /// that is a different frame than before.
    fn advance(&mut self, elapsed: Duration) -> bool;
}

/// How often an animation repeats.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoopCount {
    #[default]
    Infinite,
    Finite(NonZeroU32),
}

#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub frame: Arc<Frame>,
    pub delay: Duration,
}

impl AnimationFrame {
    pub fn new(frame: Frame, delay: Duration) -> Self {
        Self { frame: Arc::new(frame), delay }
    }
}

/// Fully decoded animation: every frame with its display time.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Arc<[AnimationFrame]>,
    loops: LoopCount,
}

impl FrameSequence {
    pub fn new(frames: Vec<AnimationFrame>, loops: LoopCount) -> Result<Self, ImageError> {
        if frames.is_empty() {
            return Err(ImageError::InvalidData("animation without frames".to_string()));
        }
        Ok(Self { frames: frames.into(), loops })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn loops(&self) -> LoopCount {
        self.loops
    }

    /// Duration of one pass over all frames.
    pub fn cycle_duration(&self) -> Duration {
        self.frames.iter().map(|f| f.delay).sum()
    }
}

impl Animation for FrameSequence {
    fn static_frame(&self) -> Arc<Frame> {
        self.frames[0].frame.clone()
    }

    fn iter(&self) -> Box<dyn FrameIterator> {
        Box::new(SequenceIter {
            frames: self.frames.clone(),
            loops: self.loops,
            cycle: self.cycle_duration(),
            index: 0,
            offset: Duration::ZERO,
            finished: false,
        })
    }
}

struct SequenceIter {
    frames: Arc<[AnimationFrame]>,
    loops: LoopCount,
    cycle: Duration,
    /// Current frame
    index: usize,
    /// Position inside the current cycle
    offset: Duration,
    /// Last frame of the last loop reached
    finished: bool,
}

impl SequenceIter {
    fn is_still(&self) -> bool {
        self.frames.len() < 2 || self.cycle.is_zero()
    }

    /// Time at which the current frame ends, relative to the cycle start.
    fn frame_end(&self) -> Duration {
        self.frames[..=self.index].iter().map(|f| f.delay).sum()
    }
}

impl FrameIterator for SequenceIter {
    fn frame(&self) -> Arc<Frame> {
        self.frames[self.index].frame.clone()
    }

    fn delay(&self) -> Option<Duration> {
        if self.finished || self.is_still() {
            return None;
        }
        Some(self.frame_end().saturating_sub(self.offset))
    }

    fn advance(&mut self, elapsed: Duration) -> bool {
        if self.finished || self.is_still() {
            return false;
        }

        let before = self.index;
        let cycle_ns = self.cycle.as_nanos();
        let elapsed_ns = elapsed.as_nanos();
        let cycles = elapsed_ns / cycle_ns;

        if let LoopCount::Finite(n) = self.loops {
            if cycles >= u128::from(n.get()) {
                self.finished = true;
                self.index = self.frames.len() - 1;
                self.offset = self.cycle;
                return self.index != before;
            }
        }

        let pos_ns = elapsed_ns % cycle_ns;
        let mut end_ns = 0u128;
        let mut index = self.frames.len() - 1;
        for (i, f) in self.frames.iter().enumerate() {
            end_ns += f.delay.as_nanos();
            if pos_ns < end_ns {
                index = i;
                break;
            }
        }

        self.index = index;
        self.offset = Duration::from_nanos(pos_ns as u64);
        self.index != before
    }
}
