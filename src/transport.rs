use std::{fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::{header::HeaderMap, tls, Certificate, Request, Response};

use crate::{headers::HeaderTransport, HttpClientError, Result};

/// The mechanism that physically sends a request and receives a response.
///
/// The client never inspects how a transport works; it only calls `send`.
/// [`ReqwestTransport`] is the standard one and [`HeaderTransport`] decorates
/// any other.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: Request) -> Result<Response>;
}

/// TLS parameters for the standard transport.
#[derive(Clone, Debug)]
pub struct TlsConfig {
    accept_invalid_certs: bool,
    built_in_roots: bool,
    root_certificates: Vec<Certificate>,
    min_version: Option<tls::Version>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            built_in_roots: true,
            root_certificates: Vec::new(),
            min_version: None,
        }
    }
}

impl TlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables certificate verification entirely. Only for testing.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Trusts an additional root certificate.
    pub fn add_root_certificate(mut self, cert: Certificate) -> Self {
        self.root_certificates.push(cert);
        self
    }

    /// Toggles the bundled web PKI roots (enabled by default).
    pub fn built_in_root_certs(mut self, enabled: bool) -> Self {
        self.built_in_roots = enabled;
        self
    }

    pub fn min_tls_version(mut self, version: tls::Version) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    pub fn uses_built_in_roots(&self) -> bool {
        self.built_in_roots
    }

    pub fn root_certificate_count(&self) -> usize {
        self.root_certificates.len()
    }

    pub fn min_version(&self) -> Option<tls::Version> {
        self.min_version
    }

    fn apply(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        let mut builder = builder
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .tls_built_in_root_certs(self.built_in_roots);
        for cert in &self.root_certificates {
            builder = builder.add_root_certificate(cert.clone());
        }
        if let Some(version) = self.min_version {
            builder = builder.min_tls_version(version);
        }
        builder
    }
}

/// Standard transport backed by a pooled [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a fresh connection pool carrying the given TLS settings.
    pub fn new(tls: &TlsConfig) -> Result<Self> {
        let client = tls.apply(reqwest::Client::builder()).build().map_err(|err| {
            HttpClientError::InvalidConfig(format!("failed to build http transport: {err}"))
        })?;
        Ok(Self { client })
    }

    /// Uses a caller-built client as-is.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.client
            .execute(request)
            .await
            .map_err(HttpClientError::transport)
    }
}

/// Construction-time description of the transport chain.
///
/// Options edit this description in order; it is turned into a live
/// transport once, when the client is built.
#[derive(Clone)]
pub enum TransportSpec {
    /// The standard reqwest transport with the given TLS settings.
    Standard(TlsConfig),
    /// A caller-supplied transport.
    Custom(Arc<dyn Transport>),
    /// `inner` wrapped by the default-header decorator.
    Headers {
        inner: Box<TransportSpec>,
        headers: HeaderMap,
    },
}

impl Default for TransportSpec {
    fn default() -> Self {
        Self::Standard(TlsConfig::default())
    }
}

impl TransportSpec {
    pub(crate) fn build(&self) -> Result<Arc<dyn Transport>> {
        match self {
            Self::Standard(tls) => Ok(Arc::new(ReqwestTransport::new(tls)?)),
            Self::Custom(transport) => Ok(Arc::clone(transport)),
            Self::Headers { inner, headers } => Ok(Arc::new(HeaderTransport::new(
                inner.build()?,
                headers.clone(),
            ))),
        }
    }
}

impl fmt::Debug for TransportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(tls) => f.debug_tuple("Standard").field(tls).finish(),
            Self::Custom(transport) => f.debug_tuple("Custom").field(transport).finish(),
            Self::Headers { inner, headers } => f
                .debug_struct("Headers")
                .field("inner", inner)
                .field("names", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}
