use crate::errors::ImageError;
use crate::provider::{decode_off_thread, DecodedSource, ResourceProvider};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Reads `file://` resources from the local filesystem.
#[derive(Clone, Debug)]
pub struct FileProvider {
    max_body_bytes: usize,
}

impl FileProvider {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }
}

impl ResourceProvider for FileProvider {
    fn fetch(&self, cancel: CancellationToken, identifier: String) -> BoxFuture<'static, Result<DecodedSource, ImageError>> {
        let limit = self.max_body_bytes;

        Box::pin(async move {
            let url = Url::parse(&identifier).map_err(|source| ImageError::InvalidUrl { url: identifier.clone(), source })?;
            let path = url
                .to_file_path()
                .map_err(|_| ImageError::InvalidData(format!("not a local file path: {url}")))?;

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > limit as u64 {
                return Err(ImageError::TooLarge { url: identifier, limit });
            }

            let bytes = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ImageError::Canceled),
                r = tokio::fs::read(&path) => r?,
            };
            decode_off_thread(bytes, &cancel).await
        })
    }
}
