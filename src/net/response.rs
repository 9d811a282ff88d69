//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response returned by the network layer. It
//! contains the final URL (after redirects), status code, response headers and the raw body.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for header names.
//! - The body is capped by [`NetConfig::max_body_bytes`](crate::config::NetConfig); a response
//!   over the limit never makes it into this struct.
//!
use http::header::CONTENT_TYPE;
use http::HeaderMap;

/// Simple structure for HTTP responses.
#[derive(Debug)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Media type from `Content-Type`, without parameters and lowercased.
    pub fn media_type(&self) -> Option<String> {
        let ct = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let media = ct.split(';').next()?.trim();
        if media.is_empty() {
            None
        } else {
            Some(media.to_ascii_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(ct: Option<&str>) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(ct) = ct {
            headers.insert(CONTENT_TYPE, ct.parse().unwrap());
        }
        Response {
            url: url::Url::parse("https://example.com/a.gif").unwrap(),
            status: 200,
            headers,
            body: vec![],
        }
    }

    #[test]
    fn media_type_strips_parameters() {
        assert_eq!(response(Some("Image/GIF; charset=binary")).media_type().as_deref(), Some("image/gif"));
    }

    #[test]
    fn media_type_missing() {
        assert_eq!(response(None).media_type(), None);
        assert_eq!(response(Some(" ")).media_type(), None);
    }
}
