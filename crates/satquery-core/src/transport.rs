//! Connection pooling and the raw HTTP send primitive.
//!
//! The transport delivers status, headers, and bytes; it never interprets
//! the body. The [`HttpTransport`] trait is the seam mock transports
//! implement in tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// HTTP method set needed by the request engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outgoing request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response delivered to the request engine: status, headers, bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Pool parameters the transport is built from; derived from [`ClientConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub pool_size: usize,
    pub keep_alive: Option<Duration>,
    /// Applied to the connect (header-receipt) phase.
    pub connect_timeout: Duration,
    /// Applied to the body-receipt phase.
    pub read_timeout: Duration,
}

impl From<&ClientConfig> for PoolSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            pool_size: config.connection_pool_size,
            keep_alive: config.keep_alive,
            connect_timeout: config.timeout,
            read_timeout: config.timeout,
        }
    }
}

/// Transport contract: a single "perform request" primitive plus pool
/// lifecycle hooks. Only implementations of this trait touch raw sockets.
pub trait HttpTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, ApiError>> + Send + 'a>>;

    /// Tears down the pool and builds a fresh one. Requests already in
    /// flight finish or fail on the old pool; they are never left hanging.
    fn reconfigure<'a>(
        &'a self,
        settings: PoolSettings,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
        let _ = settings;
        Box::pin(async { Ok(()) })
    }

    /// Releases pooled connections. Subsequent sends fail cleanly.
    /// Idempotent.
    fn shutdown<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    /// Requests currently executing on this transport.
    fn active_connections(&self) -> u32 {
        0
    }
}

/// Production transport backed by a pooled `reqwest` client.
pub struct ReqwestTransport {
    client: tokio::sync::RwLock<Option<reqwest::Client>>,
    active: AtomicU32,
}

impl ReqwestTransport {
    pub fn new(settings: PoolSettings) -> Result<Self, ApiError> {
        let client = Self::build_client(settings)?;
        Ok(Self {
            client: tokio::sync::RwLock::new(Some(client)),
            active: AtomicU32::new(0),
        })
    }

    fn build_client(settings: PoolSettings) -> Result<reqwest::Client, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("satquery/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(settings.pool_size)
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout);

        builder = match settings.keep_alive {
            Some(keep_alive) => builder
                .pool_idle_timeout(keep_alive)
                .tcp_keepalive(keep_alive),
            None => builder.pool_idle_timeout(Duration::ZERO),
        };

        builder
            .build()
            .map_err(|error| ApiError::transport(format!("failed to build http client: {error}")))
    }

    fn classify(error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::timeout(format!("request timed out: {error}"))
        } else if error.is_connect() {
            ApiError::transport(format!("connection failed: {error}"))
        } else {
            ApiError::transport(format!("request failed: {error}"))
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            // Clone the handle under the lock, then release it: requests in
            // flight during a reconfigure keep the pool they started on.
            let client = {
                let guard = self.client.read().await;
                guard.clone().ok_or_else(ApiError::closed)?
            };

            let mut builder = match request.method {
                HttpMethod::Get => client.get(&request.url),
                HttpMethod::Post => client.post(&request.url),
            };

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            self.active.fetch_add(1, Ordering::SeqCst);
            let outcome = async {
                let response = builder.send().await.map_err(Self::classify)?;

                let status = response.status().as_u16();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|value| (name.as_str().to_ascii_lowercase(), value.to_owned()))
                    })
                    .collect::<BTreeMap<_, _>>();

                let body = response
                    .bytes()
                    .await
                    .map_err(Self::classify)?
                    .to_vec();

                Ok(RawResponse {
                    status,
                    headers,
                    body,
                })
            }
            .await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            outcome
        })
    }

    fn reconfigure<'a>(
        &'a self,
        settings: PoolSettings,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let fresh = Self::build_client(settings)?;
            let mut guard = self.client.write().await;
            if guard.is_none() {
                return Err(ApiError::closed());
            }
            debug!(
                pool_size = settings.pool_size,
                "transport pool rebuilt with new settings"
            );
            *guard = Some(fresh);
            Ok(())
        })
    }

    fn shutdown<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut guard = self.client.write().await;
            *guard = None;
        })
    }

    fn active_connections(&self) -> u32 {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_headers_are_normalized_to_lowercase() {
        let request = TransportRequest::get("https://example.test/x")
            .with_header("Accept-Encoding", "gzip");
        assert_eq!(
            request.headers.get("accept-encoding").map(String::as_str),
            Some("gzip")
        );
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let response = RawResponse::ok(Vec::new()).with_header("Content-Encoding", "gzip");
        assert_eq!(response.header("CONTENT-ENCODING"), Some("gzip"));
    }

    #[test]
    fn status_classification() {
        assert!(RawResponse::ok(Vec::new()).is_success());
        assert!(!RawResponse::ok(Vec::new()).with_status(404).is_success());
        assert!(!RawResponse::ok(Vec::new()).with_status(500).is_success());
    }

    #[tokio::test]
    async fn shutdown_makes_subsequent_sends_fail_cleanly() {
        let settings = PoolSettings {
            pool_size: 1,
            keep_alive: None,
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
        };
        let transport = ReqwestTransport::new(settings).expect("transport builds");

        transport.shutdown().await;
        // Idempotent on repeated calls.
        transport.shutdown().await;

        let error = transport
            .send(TransportRequest::get("https://example.test/x"))
            .await
            .expect_err("closed transport must reject sends");
        assert_eq!(error.kind(), crate::error::ErrorKind::Closed);
    }

    #[tokio::test]
    async fn reconfigure_after_shutdown_is_rejected() {
        let settings = PoolSettings {
            pool_size: 1,
            keep_alive: None,
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
        };
        let transport = ReqwestTransport::new(settings).expect("transport builds");
        transport.shutdown().await;

        let error = transport
            .reconfigure(settings)
            .await
            .expect_err("reconfigure on a closed transport must fail");
        assert_eq!(error.kind(), crate::error::ErrorKind::Closed);
    }
}
