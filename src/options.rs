use std::{fmt, sync::Arc, time::Duration};

use reqwest::header::HeaderMap;
use tracing::Level;

use crate::{
    Backoff, HttpClient, HttpClientError, Logger, Result, TlsConfig, TracingLogger, Transport,
    TransportSpec,
};

const ENV_TIMEOUT_MS: &str = "RESILIENT_HTTP_TIMEOUT_MS";
const ENV_RETRY_COUNT: &str = "RESILIENT_HTTP_RETRY_COUNT";
const ENV_RETRY_DELAY_MS: &str = "RESILIENT_HTTP_RETRY_DELAY_MS";
const ENV_BACKOFF_BASE_MS: &str = "RESILIENT_HTTP_BACKOFF_BASE_MS";

const TLS_REPLACES_TRANSPORT: &str =
    "tls config replaces a non-standard transport; previous transport settings are dropped";

/// One configuration step. Steps are applied in order and later steps win.
#[derive(Clone, Debug)]
pub enum ClientOption {
    /// Bounds each individual attempt. `Duration::ZERO` disables the bound.
    Timeout(Duration),
    /// Retry count (total attempts = `count + 1`) and fixed inter-attempt delay.
    Retry { count: u32, delay: Duration },
    /// Installs `base * 2^(attempt - 1)`, overriding the fixed delay.
    ExponentialBackoff(Duration),
    /// Installs an arbitrary backoff function, overriding the fixed delay.
    Backoff(Backoff),
    Logger(Arc<dyn Logger>),
    /// Replaces the whole transport chain with a custom transport.
    Transport(Arc<dyn Transport>),
    /// Sets TLS parameters on the standard transport.
    ///
    /// If the current transport is anything other than the standard one
    /// (a custom transport, or one already wrapped with default headers), it
    /// is discarded and a fresh standard transport carrying only these TLS
    /// settings takes its place, and a WARN line goes to the logger in effect
    /// once all options are applied. Apply TLS before custom transports and
    /// default headers to keep them.
    TlsConfig(TlsConfig),
    /// Wraps the current transport in the default-header decorator.
    DefaultHeaders(HeaderMap),
}

impl ClientOption {
    /// Applies this step, returning a warning to log once every step is in.
    pub(crate) fn apply(self, config: &mut ClientConfig) -> Option<&'static str> {
        match self {
            Self::Timeout(timeout) => {
                config.timeout = (!timeout.is_zero()).then_some(timeout);
            }
            Self::Retry { count, delay } => {
                config.retry_count = count;
                config.retry_delay = delay;
            }
            Self::ExponentialBackoff(base) => {
                config.backoff = Some(Backoff::exponential(base));
            }
            Self::Backoff(backoff) => config.backoff = Some(backoff),
            Self::Logger(logger) => config.logger = logger,
            Self::Transport(transport) => config.transport = TransportSpec::Custom(transport),
            Self::TlsConfig(tls) => match &mut config.transport {
                TransportSpec::Standard(current) => *current = tls,
                replaced => {
                    *replaced = TransportSpec::Standard(tls);
                    return Some(TLS_REPLACES_TRANSPORT);
                }
            },
            Self::DefaultHeaders(headers) => {
                let inner = std::mem::take(&mut config.transport);
                config.transport = TransportSpec::Headers {
                    inner: Box::new(inner),
                    headers,
                };
            }
        }
        None
    }
}

/// Resolved client configuration. Read-only once the client is built.
#[derive(Clone)]
pub struct ClientConfig {
    timeout: Option<Duration>,
    retry_count: u32,
    retry_delay: Duration,
    backoff: Option<Backoff>,
    logger: Arc<dyn Logger>,
    transport: TransportSpec,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            retry_count: 0,
            retry_delay: Duration::ZERO,
            backoff: None,
            logger: Arc::new(TracingLogger),
            transport: TransportSpec::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("backoff", &self.backoff)
            .field("logger", &self.logger)
            .field("transport", &self.transport)
            .finish()
    }
}

impl ClientConfig {
    /// Applies options in order on top of the defaults.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ClientOption>,
    {
        let mut config = Self::default();
        let warnings: Vec<&str> = options
            .into_iter()
            .filter_map(|option| option.apply(&mut config))
            .collect();
        for warning in warnings {
            config.logger.log(Level::WARN, warning);
        }
        config
    }

    /// Per-attempt bound, `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn backoff(&self) -> Option<&Backoff> {
        self.backoff.as_ref()
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    pub fn transport(&self) -> &TransportSpec {
        &self.transport
    }

    /// Delay waited before retry `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff
            .as_ref()
            .map_or(self.retry_delay, |backoff| backoff.delay_for_attempt(attempt))
    }
}

/// Fluent builder for [`HttpClient`]; each call appends one [`ClientOption`].
#[derive(Clone, Debug, Default)]
pub struct HttpClientBuilder {
    options: Vec<ClientOption>,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the `RESILIENT_HTTP_*` environment variables.
    ///
    /// Reads:
    /// - `RESILIENT_HTTP_TIMEOUT_MS`: per-attempt timeout
    /// - `RESILIENT_HTTP_RETRY_COUNT`: retries after the first attempt
    /// - `RESILIENT_HTTP_RETRY_DELAY_MS`: fixed delay between attempts
    /// - `RESILIENT_HTTP_BACKOFF_BASE_MS`: enables exponential backoff
    ///
    /// Unset variables are skipped. Values that are not unsigned integers
    /// return [`HttpClientError::InvalidConfig`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| -> Result<Option<u64>> {
            match lookup(key) {
                None => Ok(None),
                Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|err| {
                    HttpClientError::InvalidConfig(format!("{key}='{raw}': {err}"))
                }),
            }
        };

        let mut builder = Self::new();
        if let Some(ms) = read(ENV_TIMEOUT_MS)? {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let count = read(ENV_RETRY_COUNT)?;
        let delay = read(ENV_RETRY_DELAY_MS)?;
        if count.is_some() || delay.is_some() {
            let count = match count {
                Some(value) => u32::try_from(value).map_err(|_| {
                    HttpClientError::InvalidConfig(format!("{ENV_RETRY_COUNT} out of range"))
                })?,
                None => 0,
            };
            builder = builder.retry(count, Duration::from_millis(delay.unwrap_or(0)));
        }
        if let Some(ms) = read(ENV_BACKOFF_BASE_MS)? {
            builder = builder.exponential_backoff(Duration::from_millis(ms));
        }
        Ok(builder)
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.option(ClientOption::Timeout(timeout))
    }

    pub fn retry(self, count: u32, delay: Duration) -> Self {
        self.option(ClientOption::Retry { count, delay })
    }

    pub fn exponential_backoff(self, base: Duration) -> Self {
        self.option(ClientOption::ExponentialBackoff(base))
    }

    pub fn backoff(self, backoff: Backoff) -> Self {
        self.option(ClientOption::Backoff(backoff))
    }

    pub fn logger(self, logger: impl Logger + 'static) -> Self {
        self.option(ClientOption::Logger(Arc::new(logger)))
    }

    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.option(ClientOption::Transport(Arc::new(transport)))
    }

    pub fn tls_config(self, tls: TlsConfig) -> Self {
        self.option(ClientOption::TlsConfig(tls))
    }

    pub fn default_headers(self, headers: HeaderMap) -> Self {
        self.option(ClientOption::DefaultHeaders(headers))
    }

    /// Appends an already-constructed option.
    pub fn option(mut self, option: ClientOption) -> Self {
        self.options.push(option);
        self
    }

    /// Options collected so far, in application order.
    pub fn options(&self) -> &[ClientOption] {
        &self.options
    }

    pub fn build(self) -> Result<HttpClient> {
        HttpClient::new(self.options)
    }
}
