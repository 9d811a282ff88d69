//! Test doubles shared by the unit tests.

use crate::animation::{Animation, FrameIterator};
use crate::errors::ImageError;
use crate::provider::{DecodedSource, ResourceProvider};
use crate::render::{scale_frame, Frame, FrameId, Geometry, Surface};
use futures::future::BoxFuture;
use image::codecs::gif::GifEncoder;
use image::{Delay, ImageFormat, Rgba, RgbaImage};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Surface with adjustable geometry that counts redraw requests and scaler calls.
#[derive(Debug)]
pub struct TestSurface {
    geometry: Mutex<Geometry>,
    draws: AtomicUsize,
    scales: AtomicUsize,
}

impl TestSurface {
    pub fn new(width: u32, height: u32, scale: u32) -> Self {
        Self {
            geometry: Mutex::new(Geometry::new(width, height, scale)),
            draws: AtomicUsize::new(0),
            scales: AtomicUsize::new(0),
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        let mut g = self.geometry.lock().unwrap();
        g.allocated.width = width;
        g.allocated.height = height;
    }

    pub fn set_scale(&self, scale: u32) {
        self.geometry.lock().unwrap().scale_factor = scale;
    }

    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    pub fn scales(&self) -> usize {
        self.scales.load(Ordering::SeqCst)
    }
}

impl Surface for TestSurface {
    fn geometry(&self) -> Geometry {
        *self.geometry.lock().unwrap()
    }

    fn queue_draw(&self) {
        self.draws.fetch_add(1, Ordering::SeqCst);
    }

    fn scale(&self, frame: &Frame, width: u32, height: u32) -> Frame {
        self.scales.fetch_add(1, Ordering::SeqCst);
        scale_frame(frame, width, height)
    }
}

type Reply = oneshot::Sender<Result<DecodedSource, ImageError>>;

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    pending: HashMap<String, VecDeque<Reply>>,
}

/// Provider whose requests stay pending until the test resolves them.
///
/// A request whose reply is dropped resolves to [`ImageError::Canceled`].
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Identifiers in the order they were requested.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of requests for `identifier`.
    pub fn calls_for(&self, identifier: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| c.as_str() == identifier).count()
    }

    /// Completes the oldest request for `identifier` that is still awaited.
    pub fn resolve(&self, identifier: &str, result: Result<DecodedSource, ImageError>) {
        let mut state = self.state.lock().unwrap();
        let queue = state.pending.get_mut(identifier).expect("no request for identifier");
        while let Some(reply) = queue.pop_front() {
            if !reply.is_closed() {
                let _ = reply.send(result);
                return;
            }
        }
        panic!("no live request for {identifier:?}");
    }

    pub fn resolve_static(&self, identifier: &str, width: u32, height: u32) -> Arc<Frame> {
        let frame = Arc::new(Frame::solid(width, height, [10, 20, 30, 255]));
        self.resolve(identifier, Ok(DecodedSource::Static(frame.clone())));
        frame
    }

    pub fn resolve_animated(&self, identifier: &str, animation: Arc<dyn Animation>) {
        self.resolve(identifier, Ok(DecodedSource::Animated(animation)));
    }
}

impl ResourceProvider for MockProvider {
    fn fetch(&self, _cancel: CancellationToken, identifier: String) -> BoxFuture<'static, Result<DecodedSource, ImageError>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            state.calls.push(identifier.clone());
            state.pending.entry(identifier).or_default().push_back(tx);
        }
        Box::pin(async move { rx.await.unwrap_or(Err(ImageError::Canceled)) })
    }
}

/// Animation that advances exactly one frame per tick, regardless of elapsed time.
#[derive(Debug)]
pub struct ScriptedAnimation {
    frames: Arc<[Arc<Frame>]>,
    delays: Arc<[Duration]>,
    looping: bool,
}

impl ScriptedAnimation {
    /// Endlessly looping animation with one frame per delay (in ms).
    pub fn new(delays_ms: &[u64]) -> Arc<Self> {
        Arc::new(Self::build(delays_ms, true))
    }

    /// Animation that plays once and stops on its last frame.
    pub fn once(delays_ms: &[u64]) -> Arc<Self> {
        Arc::new(Self::build(delays_ms, false))
    }

    fn build(delays_ms: &[u64], looping: bool) -> Self {
        let frames: Vec<_> = (0..delays_ms.len())
            .map(|i| Arc::new(Frame::solid(8, 8, [(i as u8).wrapping_mul(40), 0, 0, 255])))
            .collect();
        Self {
            frames: frames.into(),
            delays: delays_ms.iter().map(|&ms| Duration::from_millis(ms)).collect(),
            looping,
        }
    }

    pub fn frame_id(&self, index: usize) -> FrameId {
        self.frames[index].id()
    }
}

impl Animation for ScriptedAnimation {
    fn static_frame(&self) -> Arc<Frame> {
        self.frames[0].clone()
    }

    fn iter(&self) -> Box<dyn FrameIterator> {
        Box::new(ScriptedIter {
            frames: self.frames.clone(),
            delays: self.delays.clone(),
            looping: self.looping,
            index: 0,
            done: false,
        })
    }
}

struct ScriptedIter {
    frames: Arc<[Arc<Frame>]>,
    delays: Arc<[Duration]>,
    looping: bool,
    index: usize,
    done: bool,
}

impl FrameIterator for ScriptedIter {
    fn frame(&self) -> Arc<Frame> {
        self.frames[self.index].clone()
    }

    fn delay(&self) -> Option<Duration> {
        if self.done {
            None
        } else {
            Some(self.delays[self.index])
        }
    }

    fn advance(&mut self, _elapsed: Duration) -> bool {
        if self.index + 1 < self.frames.len() {
            self.index += 1;
            true
        } else if self.looping {
            self.index = 0;
            true
        } else {
            self.done = true;
            false
        }
    }
}

/// Encodes an animated GIF with one 4x4 frame per delay (in ms).
pub fn gif_bytes(delays_ms: &[u64]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        let frames = delays_ms.iter().enumerate().map(|(i, &ms)| {
            let img = RgbaImage::from_pixel(4, 4, Rgba([(i as u8).wrapping_mul(60), 100, 0, 255]));
            image::Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(ms as u32, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

/// Encodes a solid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}
