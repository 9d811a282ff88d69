//! Binds online images to on-screen surfaces.
//!
//! An [`ImageBinding`] fetches an identifier (an `http(s)`, `file` or `data` URL) only while its
//! surface is visible, shows the decoded frame scaled for the surface, and plays animations only
//! while the surface is mapped and its top-level is focused.

pub mod animation;
pub mod binding;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod net;
pub mod provider;
pub mod render;
pub mod report;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use binding::{BindingHandle, BindingId, BindingWorker, ImageBinding};
pub use config::{BindingConfig, NetConfig};
pub use errors::{BindingError, ConfigError, ImageError};
pub use provider::{DecodedSource, ResourceProvider, SchemeProvider};
pub use render::{Frame, Geometry, Surface, SurfaceSize};
pub use report::{ErrorReport, ErrorSink, LogErrorSink};
