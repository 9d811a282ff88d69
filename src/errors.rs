/// Errors that can happen while retrieving or decoding an online image.
///
/// None of these are fatal. A binding that hits one keeps showing whatever it showed before and
/// retries the next time it becomes visible or gets a new source.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Invalid image URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Fetch canceled")]
    Canceled,

    #[error("Network error: {0}")]
    Net(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Response for {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid image data: {0}")]
    InvalidData(String),

    #[error("No async runtime available to run the fetch on")]
    NoRuntime,
}

impl ImageError {
    /// Returns true when the error only means the work was no longer wanted.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ImageError::Canceled)
    }
}

/// Validation errors returned by the configuration builders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_fps must be at least 1")]
    ZeroFps,

    #[error("anim_max_size must be non-zero, got {width}x{height}")]
    ZeroAnimSize { width: u32, height: u32 },

    #[error("max_body_bytes must be non-zero")]
    ZeroBodyLimit,
}

/// Errors returned by a [`crate::binding::BindingHandle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("Binding worker has shut down")]
    WorkerClosed,
}
