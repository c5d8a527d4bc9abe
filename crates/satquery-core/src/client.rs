//! The request engine: identity, cache, transport, decode, envelope unwrap,
//! retries, and metrics composed behind `get`/`post`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::config::{ClientConfig, ConfigUpdate};
use crate::decode::decode_body;
use crate::envelope::unwrap_envelope;
use crate::error::ApiError;
use crate::identity::{render_query, RequestIdentity};
use crate::metrics::{MetricsRecorder, MetricsSnapshot};
use crate::retry::retry_with_backoff;
use crate::transport::{
    HttpMethod, HttpTransport, PoolSettings, ReqwestTransport, TransportRequest,
};

/// The chain segment of every request path; networks vary, the chain does not.
const CHAIN: &str = "btc";

/// Owned client instance over one base endpoint.
///
/// All shared state (cache, metrics, pool handle) lives on this struct and
/// is mutated only through its methods. Construct one per endpoint and pass
/// it explicitly to whatever needs it; there is no process-wide default.
pub struct ApiClient {
    config: tokio::sync::RwLock<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    cache: ResponseCache,
    metrics: MetricsRecorder,
    closed: AtomicBool,
}

impl ApiClient {
    /// Creates a client with a pooled production transport.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new(PoolSettings::from(&config))?);
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client over a caller-supplied transport. This is the seam
    /// tests use to substitute a scripted transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let cache = ResponseCache::new(config.effective_cache_max_age());
        let metrics = MetricsRecorder::new(config.metrics_enabled);
        Self {
            config: tokio::sync::RwLock::new(config),
            transport,
            cache,
            metrics,
            closed: AtomicBool::new(false),
        }
    }

    /// GET returning the unwrapped envelope payload.
    pub async fn get_value(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let params = params
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<BTreeMap<_, _>>();
        self.execute(HttpMethod::Get, path, params, None).await
    }

    /// GET deserialized into a typed payload.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let value = self.get_value(path, params).await?;
        deserialize_payload(value)
    }

    /// POST returning the unwrapped envelope payload.
    pub async fn post_value(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.execute(HttpMethod::Post, path, BTreeMap::new(), Some(body))
            .await
    }

    /// POST deserialized into a typed payload.
    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let value = self.post_value(path, body).await?;
        deserialize_payload(value)
    }

    /// Counters and pool gauges.
    pub async fn metrics(&self) -> MetricsSnapshot {
        let max_connections = {
            let config = self.config.read().await;
            config.connection_pool_size as u32
        };
        self.metrics.snapshot(
            self.cache.stats().await,
            self.transport.active_connections(),
            max_connections,
        )
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Snapshot of the current configuration.
    pub async fn config(&self) -> ClientConfig {
        self.config.read().await.clone()
    }

    /// Applies a partial configuration update. Pool-affecting changes tear
    /// down and rebuild the transport; requests in flight finish on the old
    /// pool.
    pub async fn update_config(&self, update: ConfigUpdate) -> Result<(), ApiError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ApiError::closed());
        }

        let (rebuild, settings, cache_max_age, metrics_enabled) = {
            let mut config = self.config.write().await;
            let rebuild = update.apply(&mut config);
            (
                rebuild,
                PoolSettings::from(&*config),
                config.effective_cache_max_age(),
                config.metrics_enabled,
            )
        };

        self.cache.set_max_age(cache_max_age).await;
        self.metrics.set_enabled(metrics_enabled);

        if rebuild {
            self.transport.reconfigure(settings).await?;
        }

        Ok(())
    }

    /// Releases pooled connections and clears the cache. Idempotent; every
    /// operation after the first `close` fails with a closed error.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.transport.shutdown().await;
        self.cache.clear().await;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        params: BTreeMap<String, String>,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ApiError::closed());
        }

        let config = self.config.read().await.clone();

        // Identity is keyed on the network-qualified resource so a runtime
        // network switch never serves entries cached for another network.
        let resource = format!("{CHAIN}/{}/{}", config.network, path.trim_start_matches('/'));
        let identity = match &body {
            Some(body) => RequestIdentity::from_body(&resource, body),
            None => RequestIdentity::new(&resource, &params),
        };

        if let Some(value) = self.cache.get(identity.as_str()).await {
            debug!(identity = %identity, "cache hit");
            return Ok(value);
        }
        debug!(identity = %identity, "cache miss");

        let url = build_url(&config, &resource, &params);
        let body_bytes = body.as_ref().map(|body| {
            serde_json::to_vec(body).expect("serde_json::Value serialization cannot fail")
        });

        let started = Instant::now();
        let result = retry_with_backoff(config.max_attempts, config.backoff, || {
            let request = build_request(&config, method, &url, body_bytes.clone());
            let transport = Arc::clone(&self.transport);
            let accepted = &config.accepted_encodings;
            async move {
                let response = transport.send(request).await?;
                if response.status >= 400 {
                    return Err(ApiError::http_status(response.status));
                }
                let decoded = decode_body(&response, accepted)?;
                unwrap_envelope(decoded)
            }
        })
        .await;
        let elapsed = started.elapsed();

        match result {
            Ok(value) => {
                self.cache.put(identity.into_key(), value.clone()).await;
                self.metrics.record_success(elapsed);
                Ok(value)
            }
            Err(error) => {
                warn!(
                    identity = %identity,
                    code = error.code(),
                    "request failed: {}",
                    error.message()
                );
                self.metrics.record_error(elapsed);
                Err(error)
            }
        }
    }
}

fn build_url(config: &ClientConfig, resource: &str, params: &BTreeMap<String, String>) -> String {
    let base = config.base_url.trim_end_matches('/');
    let mut url = format!("{base}/{resource}");
    if !params.is_empty() {
        url.push('?');
        url.push_str(&render_query(params));
    }
    url
}

fn build_request(
    config: &ClientConfig,
    method: HttpMethod,
    url: &str,
    body: Option<Vec<u8>>,
) -> TransportRequest {
    let mut request = TransportRequest::new(method, url).with_header("accept", "application/json");

    if config.compression_enabled && !config.accepted_encodings.is_empty() {
        request = request.with_header("accept-encoding", config.accepted_encodings.join(", "));
    }

    for (name, value) in &config.headers {
        request = request.with_header(name.clone(), value.clone());
    }

    match body {
        Some(body) => request
            .with_header("content-type", "application/json")
            .with_body(body),
        None => request,
    }
}

fn deserialize_payload<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|error| {
        ApiError::decode(
            format!("failed to deserialize response payload: {error}"),
            serde_json::json!({ "expected": std::any::type_name::<T>() }),
        )
    })
}
