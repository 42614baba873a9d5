use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::{HttpClientError, Result};

/// Reads the whole body as text and releases the response.
///
/// The response is consumed, so it cannot be read twice:
///
/// ```compile_fail
/// # async fn demo(response: reqwest::Response) {
/// let first = resilient_http::read_body(response).await;
/// let second = resilient_http::read_body(response).await;
/// # }
/// ```
pub async fn read_body(response: Response) -> Result<String> {
    response.text().await.map_err(HttpClientError::Body)
}

/// Decodes a successful response body as JSON.
///
/// A status outside `200..300` yields [`HttpClientError::UnexpectedStatus`]
/// without touching the body. The response is released either way.
pub async fn read_json_body<T>(response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        return Err(HttpClientError::UnexpectedStatus(status.as_u16()));
    }
    let bytes = response.bytes().await.map_err(HttpClientError::Body)?;
    serde_json::from_slice(&bytes).map_err(HttpClientError::Decode)
}
