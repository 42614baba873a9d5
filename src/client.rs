use std::{fmt, sync::Arc};

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Body, Method, Request, Response, Url,
};
use serde::Serialize;
use tokio::time::{sleep, timeout};
use tracing::Level;

use crate::{
    header_map, ClientConfig, ClientOption, HttpClientBuilder, HttpClientError, Result, Transport,
};

/// HTTP client that retries failed requests and stamps default headers.
///
/// Cheap to clone; clones share the same transport and configuration.
#[derive(Clone)]
pub struct HttpClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Creates a client by applying `options` in order on top of the defaults.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use resilient_http::{ClientOption, HttpClient};
    ///
    /// let client = HttpClient::new([
    ///     ClientOption::Timeout(Duration::from_secs(5)),
    ///     ClientOption::Retry { count: 3, delay: Duration::from_millis(200) },
    ///     ClientOption::ExponentialBackoff(Duration::from_millis(100)),
    /// ])
    /// .expect("client must build");
    /// ```
    pub fn new<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = ClientOption>,
    {
        Self::from_config(ClientConfig::from_options(options))
    }

    /// Returns a builder that collects options fluently.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Builds the transport chain described by `config`.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let transport = config.transport().build()?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `request`, retrying on transport failures and on any status
    /// outside `200..300`.
    ///
    /// The first successful response is returned and its body belongs to the
    /// caller. Bodies of unsuccessful responses are released before the next
    /// attempt. When every attempt fails, the error of the final attempt is
    /// returned; a non-2xx final attempt yields
    /// [`HttpClientError::NonSuccessStatus`] without the status code.
    ///
    /// Dropping the returned future abandons both the pending wait and the
    /// in-flight send.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let retries = self.config.retry_count();
        let mut pending = Some(request);
        let mut last_err = None;

        for attempt in 0..=retries {
            if pending.is_none() {
                self.log(
                    Level::WARN,
                    format_args!(
                        "request body cannot be replayed; giving up after {attempt} attempt(s)"
                    ),
                );
                break;
            }

            if attempt > 0 {
                let delay = self.config.delay_for_attempt(attempt);
                self.log(
                    Level::INFO,
                    format_args!("retrying request ({attempt}/{retries}) after {delay:?}"),
                );
                sleep(delay).await;
            }

            let Some(request) = next_attempt(&mut pending, attempt < retries) else {
                break;
            };

            match self.send_once(request).await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    self.log(
                        Level::WARN,
                        format_args!("received non-2xx response: {}", response.status().as_u16()),
                    );
                    drop(response);
                    last_err = Some(HttpClientError::NonSuccessStatus);
                }
                Err(err) => {
                    self.log(Level::WARN, format_args!("request failed: {err}"));
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            HttpClientError::InvalidConfig("request was never sent".to_owned())
        }))
    }

    /// Sends a `GET` request with the given headers.
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response> {
        let request = build_request(Method::GET, url, None, header_map(headers)?)?;
        self.execute(request).await
    }

    /// Sends a `POST` request with the given body and headers.
    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let request = build_request(Method::POST, url, Some(body.into()), header_map(headers)?)?;
        self.execute(request).await
    }

    /// Sends a `PUT` request with the given body and headers.
    pub async fn put(
        &self,
        url: &str,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let request = build_request(Method::PUT, url, Some(body.into()), header_map(headers)?)?;
        self.execute(request).await
    }

    /// Sends a `DELETE` request with the given headers.
    pub async fn delete(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response> {
        let request = build_request(Method::DELETE, url, None, header_map(headers)?)?;
        self.execute(request).await
    }

    /// Serializes `value` as JSON and `POST`s it.
    ///
    /// `Content-Type` is always `application/json`, whatever `headers` says.
    /// Serialization failures are reported before anything is sent.
    pub async fn post_json<T>(
        &self,
        url: &str,
        value: &T,
        headers: &[(&str, &str)],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(value).map_err(HttpClientError::Encode)?;
        let mut headers = header_map(headers)?;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let request = build_request(Method::POST, url, Some(body.into()), headers)?;
        self.execute(request).await
    }

    async fn send_once(&self, request: Request) -> Result<Response> {
        match self.config.timeout() {
            Some(limit) => timeout(limit, self.transport.send(request))
                .await
                .map_err(|_| HttpClientError::TimedOut(limit))?,
            None => self.transport.send(request).await,
        }
    }

    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.config.logger().log(level, &message.to_string());
    }
}

/// Picks the request for the next attempt.
///
/// While more attempts remain a copy is sent so the original can be replayed;
/// the final attempt (or a body that cannot be copied) consumes the original.
fn next_attempt(pending: &mut Option<Request>, more_attempts: bool) -> Option<Request> {
    if more_attempts {
        if let Some(copy) = pending.as_ref().and_then(Request::try_clone) {
            return Some(copy);
        }
    }
    pending.take()
}

fn build_request(
    method: Method,
    url: &str,
    body: Option<Body>,
    headers: HeaderMap,
) -> Result<Request> {
    let target = Url::parse(url).map_err(|err| HttpClientError::InvalidUrl {
        url: url.to_owned(),
        reason: err.to_string(),
    })?;
    let mut request = Request::new(method, target);
    *request.headers_mut() = headers;
    *request.body_mut() = body;
    Ok(request)
}
