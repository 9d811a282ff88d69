use crate::errors::ImageError;
use crate::net::Response;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Loads an URL and returns the buffered response.
///
/// The body is read chunk by chunk so a cancelled token stops the transfer at the next chunk, and
/// so that responses over `max_body_bytes` are rejected without buffering them whole. Non-success
/// statuses are returned as [`ImageError::Status`].
pub async fn fetch(
    client: &reqwest::Client,
    url: Url,
    max_body_bytes: usize,
    cancel: &CancellationToken,
) -> Result<Response, ImageError> {
    let mut res = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ImageError::Canceled),
        r = client.get(url).send() => r?,
    };

    // Fetch results
    let final_url = res.url().clone();
    let status = res.status();
    let headers = res.headers().clone();

    if !status.is_success() {
        return Err(ImageError::Status { url: final_url.to_string(), status: status.as_u16() });
    }

    if res.content_length().is_some_and(|len| len > max_body_bytes as u64) {
        return Err(ImageError::TooLarge { url: final_url.to_string(), limit: max_body_bytes });
    }

    let mut body = Vec::new();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ImageError::Canceled),
            c = res.chunk() => c?,
        };
        let Some(chunk) = chunk else {
            break;
        };
        if body.len() + chunk.len() > max_body_bytes {
            return Err(ImageError::TooLarge { url: final_url.to_string(), limit: max_body_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Response {
        url: final_url,
        status: status.as_u16(),
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let client = reqwest::Client::new();
        let cancel = CancellationToken::new();
        cancel.cancel(); // cancel immediately to force the cancel branch

        // Unroutable address, the request would otherwise hang or fail
        let url = Url::parse("http://10.255.255.1/never.png").unwrap();
        let res = fetch(&client, url, 1024, &cancel).await;
        assert!(matches!(res, Err(ImageError::Canceled)), "expected cancel, got {:?}", res.err());
    }
}
