//! Resource providers: turn an identifier into decoded frames.
//!
//! A provider runs off the binding's loop. It receives the cancellation token of the request and
//! must stop working once it is cancelled; whatever it still returns afterwards is discarded by
//! the binding.
//!
//! The bundled providers are routed by URL scheme through [`SchemeProvider`]:
//! - `http`/`https` via [`HttpProvider`]
//! - `file` via [`FileProvider`]
//! - `data` via [`DataProvider`]

mod data;
mod decode;
mod file;
mod http;
mod scheme;

pub use data::DataProvider;
pub use decode::{decode_bytes, decode_off_thread, DEFAULT_FRAME_DELAY};
pub use file::FileProvider;
pub use http::HttpProvider;
pub use scheme::SchemeProvider;

use crate::animation::Animation;
use crate::errors::ImageError;
use crate::render::Frame;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Decoded content of a resource.
#[derive(Debug, Clone)]
pub enum DecodedSource {
    /// A single still frame
    Static(Arc<Frame>),
    /// A multi-frame animation
    Animated(Arc<dyn Animation>),
}

impl DecodedSource {
    /// Frame to display when nothing animates.
    pub fn display_frame(&self) -> Arc<Frame> {
        match self {
            DecodedSource::Static(frame) => frame.clone(),
            DecodedSource::Animated(anim) => anim.static_frame(),
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, DecodedSource::Animated(_))
    }
}

/// Retrieves and decodes resources by identifier.
pub trait ResourceProvider: Send + Sync {
    /// Starts fetching `identifier`. The returned future resolves exactly once. It should resolve
    /// to [`ImageError::Canceled`] soon after `cancel` is cancelled.
    fn fetch(&self, cancel: CancellationToken, identifier: String) -> BoxFuture<'static, Result<DecodedSource, ImageError>>;
}
