use crate::config::NetConfig;
use crate::errors::ImageError;
use crate::provider::{DataProvider, DecodedSource, FileProvider, HttpProvider, ResourceProvider};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Routes identifiers to a provider based on their URL scheme.
#[derive(Clone, Default)]
pub struct SchemeProvider {
    providers: HashMap<String, Arc<dyn ResourceProvider>>,
}

impl SchemeProvider {
    /// An empty router, every identifier fails with [`ImageError::UnsupportedScheme`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the bundled `http`, `https`, `data` and (when allowed) `file` providers.
    pub fn with_defaults(config: &NetConfig) -> Result<Self, ImageError> {
        let http: Arc<dyn ResourceProvider> = Arc::new(HttpProvider::new(config)?);

        let mut this = Self::new();
        this.register("http", http.clone());
        this.register("https", http);
        this.register("data", Arc::new(DataProvider));
        if config.enable_local_file_access {
            this.register("file", Arc::new(FileProvider::new(config.max_body_bytes)));
        }
        Ok(this)
    }

    /// Adds or replaces the provider for `scheme`.
    pub fn register(&mut self, scheme: &str, provider: Arc<dyn ResourceProvider>) {
        self.providers.insert(scheme.to_ascii_lowercase(), provider);
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.providers.contains_key(&scheme.to_ascii_lowercase())
    }
}

impl std::fmt::Debug for SchemeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<_> = self.providers.keys().collect();
        schemes.sort();
        f.debug_struct("SchemeProvider").field("schemes", &schemes).finish()
    }
}

impl ResourceProvider for SchemeProvider {
    fn fetch(&self, cancel: CancellationToken, identifier: String) -> BoxFuture<'static, Result<DecodedSource, ImageError>> {
        let scheme = match Url::parse(&identifier) {
            Ok(url) => url.scheme().to_string(),
            Err(source) => {
                return Box::pin(async move { Err(ImageError::InvalidUrl { url: identifier, source }) });
            }
        };

        match self.providers.get(&scheme) {
            Some(provider) => provider.fetch(cancel, identifier),
            None => Box::pin(async move { Err(ImageError::UnsupportedScheme(scheme)) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png_bytes, MockProvider};
    use base64::Engine;

    #[tokio::test]
    async fn routes_by_scheme() {
        let mock = MockProvider::new();
        let mut router = SchemeProvider::new();
        router.register("Mock", mock.clone());
        assert!(router.supports("mock"));

        let fut = router.fetch(CancellationToken::new(), "mock://avatar/1".to_string());
        mock.resolve_static("mock://avatar/1", 4, 4);
        assert_eq!(fut.await.unwrap().display_frame().width(), 4);
        assert_eq!(mock.calls(), vec!["mock://avatar/1".to_string()]);
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let router = SchemeProvider::new();
        let err = router.fetch(CancellationToken::new(), "gopher://x/y".to_string()).await.unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedScheme(s) if s == "gopher"));
    }

    #[tokio::test]
    async fn unparseable_identifier_is_invalid() {
        let router = SchemeProvider::new();
        let err = router.fetch(CancellationToken::new(), "not a url".to_string()).await.unwrap_err();
        assert!(matches!(err, ImageError::InvalidUrl { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn defaults_serve_data_urls_and_respect_file_access() {
        let cfg = NetConfig::builder().enable_local_file_access(false).build().unwrap();
        let router = SchemeProvider::with_defaults(&cfg).unwrap();
        assert!(router.supports("https"));
        assert!(!router.supports("file"));

        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(1, 1));
        let decoded = router
            .fetch(CancellationToken::new(), format!("data:image/png;base64,{encoded}"))
            .await
            .unwrap();
        assert!(!decoded.is_animated());
    }
}
