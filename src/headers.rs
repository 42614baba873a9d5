use std::{fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Request, Response,
};

use crate::{HttpClientError, Result, Transport};

/// Transport decorator that stamps a fixed header set on every request.
///
/// Headers are applied at send time with overwrite semantics, so a value the
/// caller set for the same name is replaced.
pub struct HeaderTransport {
    inner: Arc<dyn Transport>,
    headers: HeaderMap,
}

impl HeaderTransport {
    pub fn new(inner: Arc<dyn Transport>, headers: HeaderMap) -> Self {
        Self { inner, headers }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl fmt::Debug for HeaderTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderTransport")
            .field("inner", &self.inner)
            .field("names", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl Transport for HeaderTransport {
    async fn send(&self, mut request: Request) -> Result<Response> {
        let target = request.headers_mut();
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
        self.inner.send(request).await
    }
}

/// Builds a [`HeaderMap`] from name/value pairs, one value per name.
///
/// Later pairs overwrite earlier ones with the same name.
pub fn header_map(pairs: &[(&str, &str)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(pairs.len());
    for (raw_name, raw_value) in pairs {
        let name = HeaderName::from_bytes(raw_name.as_bytes())
            .map_err(|err| HttpClientError::InvalidHeader(format!("'{raw_name}': {err}")))?;
        let value = HeaderValue::from_str(raw_value).map_err(|err| {
            HttpClientError::InvalidHeader(format!("value for '{raw_name}': {err}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
