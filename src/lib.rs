//! `resilient-http` is a thin async wrapper around [`reqwest`] that adds
//! retries, backoff and default headers.
//!
//! - [`HttpClient::execute`] retries transport failures and non-2xx statuses
//! - [`HttpClient::get`], [`HttpClient::post`], [`HttpClient::put`],
//!   [`HttpClient::delete`] and [`HttpClient::post_json`] build requests
//! - [`read_body`] and [`read_json_body`] consume responses
//!
//! Configuration is an ordered list of [`ClientOption`]s, or the equivalent
//! [`HttpClientBuilder`] calls.

mod backoff;
mod body;
mod client;
mod error;
mod headers;
mod logger;
mod options;
mod transport;

pub use backoff::Backoff;
pub use body::{read_body, read_json_body};
pub use client::HttpClient;
pub use error::{BoxError, HttpClientError};
pub use headers::{header_map, HeaderTransport};
pub use logger::{Logger, NoopLogger, TracingLogger};
pub use options::{ClientConfig, ClientOption, HttpClientBuilder};
pub use transport::{ReqwestTransport, TlsConfig, Transport, TransportSpec};

pub type Result<T> = std::result::Result<T, HttpClientError>;
