use crate::errors::ImageError;
use crate::provider::{decode_off_thread, DecodedSource, ResourceProvider};
use base64::Engine;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

const DATA_URL_PREFIX: &str = "data:";

/// Decodes inline `data:` URLs (RFC 2397). The media type is ignored; the payload is sniffed.
#[derive(Clone, Debug, Default)]
pub struct DataProvider;

impl ResourceProvider for DataProvider {
    fn fetch(&self, cancel: CancellationToken, identifier: String) -> BoxFuture<'static, Result<DecodedSource, ImageError>> {
        Box::pin(async move {
            let bytes = decode_data_url(&identifier)?;
            decode_off_thread(bytes, &cancel).await
        })
    }
}

/// Extracts the payload of a data URL.
pub(crate) fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageError> {
    let rest = url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| ImageError::InvalidData("URL does not start with 'data:'".to_string()))?;
    let (metadata, data) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidData("missing comma in data URL".to_string()))?;

    let is_base64 = metadata.split(';').skip(1).any(|p| p.trim().eq_ignore_ascii_case("base64"));

    if is_base64 {
        let cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| ImageError::InvalidData(format!("invalid base64: {e}")))
    } else {
        percent_decode(data)
    }
}

/// Percent-decodes a payload without treating '+' specially.
fn percent_decode(input: &str) -> Result<Vec<u8>, ImageError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let hex = bytes
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ImageError::InvalidData("invalid percent-escape in data URL".to_string()))?;
        out.push(hex);
        i += 3;
    }

    Ok(out)
}
