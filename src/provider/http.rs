use crate::config::NetConfig;
use crate::errors::ImageError;
use crate::net;
use crate::provider::{decode_off_thread, DecodedSource, ResourceProvider};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Fetches `http` and `https` resources with a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpProvider {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpProvider {
    pub fn new(config: &NetConfig) -> Result<Self, ImageError> {
        Ok(Self {
            client: net::build_client(&config.user_agent)?,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Uses an existing client, for hosts that already configured one (proxies, cookies, ...).
    pub fn with_client(client: reqwest::Client, max_body_bytes: usize) -> Self {
        Self { client, max_body_bytes }
    }
}

impl ResourceProvider for HttpProvider {
    fn fetch(&self, cancel: CancellationToken, identifier: String) -> BoxFuture<'static, Result<DecodedSource, ImageError>> {
        let client = self.client.clone();
        let limit = self.max_body_bytes;

        Box::pin(async move {
            let url = Url::parse(&identifier).map_err(|source| ImageError::InvalidUrl { url: identifier.clone(), source })?;
            let resp = net::fetch(&client, url, limit, &cancel).await?;
            log::debug!(
                "fetched {} ({} bytes, {})",
                resp.url,
                resp.body.len(),
                resp.media_type().unwrap_or_else(|| "unknown type".to_string())
            );
            decode_off_thread(resp.body, &cancel).await
        })
    }
}
