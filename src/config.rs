//! Binding and network configuration.
//!
//! [`BindingConfig`] controls how a single image binding animates and scales, [`NetConfig`]
//! controls the default network providers. Both come with sensible defaults via [`Default`] and
//! a fluent builder that validates the result.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use onlineimage::config::BindingConfig;
//! let cfg = BindingConfig::default();
//! assert_eq!(cfg.max_fps, 50);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use onlineimage::config::BindingConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = BindingConfig::builder()
//!     .max_fps(30)
//!     .animations_enabled(false)
//!     .build()?;
//! assert_eq!(cfg.max_fps, 30);
//! # Ok(()) }
//! ```
//!
//! Both structs are `serde` serializable so hosts can keep them in their own settings files.

use crate::errors::ConfigError;
use crate::render::SurfaceSize;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Gosub-OnlineImage/0.1 (+https://gosub.io)";

/// Maximum frame rate an animation is played back at. The real rate depends on the host's draw
/// clock, this only bounds how often the background tick fires.
pub const DEFAULT_MAX_FPS: u32 = 50;

/// Animated frames larger than this are displayed unscaled.
pub const DEFAULT_ANIM_MAX_SIZE: SurfaceSize = SurfaceSize { width: 2000, height: 2000 };

/// Configuration for a single image binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Upper bound for animation redraws per second
    pub max_fps: u32,
    /// When false, animated images only show their static frame
    pub animations_enabled: bool,
    /// Animated frames beyond this size are not scaled
    pub anim_max_size: SurfaceSize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            max_fps: DEFAULT_MAX_FPS,
            animations_enabled: true,
            anim_max_size: DEFAULT_ANIM_MAX_SIZE,
        }
    }
}

impl BindingConfig {
    pub fn builder() -> BindingConfigBuilder {
        BindingConfigBuilder::default()
    }

    /// Shortest delay between two animation ticks, `floor(1000 / max_fps)` milliseconds.
    pub fn min_frame_delay(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.max_fps.max(1)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BindingConfigBuilder {
    inner: BindingConfig,
}

impl BindingConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut BindingConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn max_fps(self, fps: u32) -> Self { self.map(|c| c.max_fps = fps) }
    pub fn animations_enabled(self, on: bool) -> Self { self.map(|c| c.animations_enabled = on) }
    pub fn anim_max_size(self, width: u32, height: u32) -> Self {
        self.map(|c| c.anim_max_size = SurfaceSize { width, height })
    }

    /// Validate and build the final config.
    pub fn build(self) -> Result<BindingConfig, ConfigError> {
        let c = self.inner;
        if c.max_fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        if c.anim_max_size.width == 0 || c.anim_max_size.height == 0 {
            return Err(ConfigError::ZeroAnimSize {
                width: c.anim_max_size.width,
                height: c.anim_max_size.height,
            });
        }
        Ok(c)
    }
}

/// Configuration for the bundled network providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Responses larger than this are rejected before decoding
    pub max_body_bytes: usize,
    /// Allow `file://` identifiers
    pub enable_local_file_access: bool,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_bytes: 32 * 1024 * 1024,
            enable_local_file_access: true,
        }
    }
}

impl NetConfig {
    pub fn builder() -> NetConfigBuilder {
        NetConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetConfigBuilder {
    inner: NetConfig,
}

impl NetConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut NetConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn max_body_bytes(self, n: usize) -> Self { self.map(|c| c.max_body_bytes = n) }
    pub fn enable_local_file_access(self, on: bool) -> Self { self.map(|c| c.enable_local_file_access = on) }

    pub fn build(self) -> Result<NetConfig, ConfigError> {
        if self.inner.max_body_bytes == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_floor_is_twenty_ms() {
        assert_eq!(BindingConfig::default().min_frame_delay(), Duration::from_millis(20));
    }

    #[test]
    fn builder_rejects_zero_fps() {
        let err = BindingConfig::builder().max_fps(0).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroFps);
    }

    #[test]
    fn builder_rejects_zero_anim_size() {
        let err = BindingConfig::builder().anim_max_size(0, 10).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroAnimSize { width: 0, height: 10 });
    }

    #[test]
    fn odd_fps_floors_the_delay() {
        let cfg = BindingConfig::builder().max_fps(30).build().unwrap();
        assert_eq!(cfg.min_frame_delay(), Duration::from_millis(33));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: BindingConfig = serde_json::from_str(r#"{ "max_fps": 25 }"#).unwrap();
        assert_eq!(cfg.max_fps, 25);
        assert!(cfg.animations_enabled);
        assert_eq!(cfg.anim_max_size, DEFAULT_ANIM_MAX_SIZE);

        let net: NetConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(net, NetConfig::default());
    }

    #[test]
    fn net_builder_rejects_zero_limit() {
        assert_eq!(NetConfig::builder().max_body_bytes(0).build().unwrap_err(), ConfigError::ZeroBodyLimit);
        let cfg = NetConfig::builder().user_agent("test/1.0").build().unwrap();
        assert_eq!(cfg.user_agent, "test/1.0");
    }
}
