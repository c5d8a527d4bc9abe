//! Shared test support: a scripted transport implementing the engine's
//! transport seam, plus fixture helpers for envelope bodies.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

pub use satquery_core::{
    ApiClient, ApiError, Backoff, BatchCall, ClientConfig, ConfigUpdate, ErrorKind, HttpTransport,
    Network, RawResponse, TransportRequest,
};

struct Route {
    needle: String,
    script: VecDeque<Result<RawResponse, ApiError>>,
}

/// Transport stub that serves scripted outcomes per URL fragment and
/// records every request it sees.
pub struct StubTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<TransportRequest>>,
    sends: AtomicU32,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            sends: AtomicU32::new(0),
        }
    }

    /// Registers outcomes for URLs containing `needle`, consumed in order.
    pub fn route(
        self,
        needle: impl Into<String>,
        script: Vec<Result<RawResponse, ApiError>>,
    ) -> Self {
        self.routes.lock().expect("routes lock").push(Route {
            needle: needle.into(),
            script: script.into(),
        });
        self
    }

    pub fn send_count(&self) -> u32 {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn seen_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    pub fn seen_requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for StubTransport {
    fn send<'a>(
        &'a self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, ApiError>> + Send + 'a>> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let outcome = {
            let mut routes = self.routes.lock().expect("routes lock");
            match routes
                .iter_mut()
                .find(|route| request.url.contains(&route.needle))
            {
                Some(route) => route
                    .script
                    .pop_front()
                    .unwrap_or_else(|| Err(ApiError::transport("scripted route exhausted"))),
                None => Err(ApiError::transport(format!(
                    "no scripted route matches {}",
                    request.url
                ))),
            }
        };

        Box::pin(async move { outcome })
    }
}

/// A 200 response wrapping `data` in a success envelope.
pub fn envelope_ok(data: Value) -> Result<RawResponse, ApiError> {
    Ok(RawResponse::ok(
        serde_json::to_vec(&json!({"code": 0, "msg": "ok", "data": data})).expect("fixture"),
    ))
}

/// A 200 response carrying a protocol-level rejection.
pub fn envelope_err(code: i64, msg: &str) -> Result<RawResponse, ApiError> {
    Ok(RawResponse::ok(
        serde_json::to_vec(&json!({"code": code, "msg": msg, "data": null})).expect("fixture"),
    ))
}

/// An empty-bodied response with the given HTTP status.
pub fn status(status: u16) -> Result<RawResponse, ApiError> {
    Ok(RawResponse::ok(Vec::new()).with_status(status))
}

/// Client wired to the stub transport with test-friendly backoff.
pub fn client_over(transport: Arc<StubTransport>) -> ApiClient {
    ApiClient::with_transport(
        test_config(),
        transport as Arc<dyn HttpTransport>,
    )
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new("https://index.test", Network::Mainnet)
        .with_backoff(Backoff::Linear {
            delay: Duration::from_millis(1),
        })
        .with_cache(true, Duration::from_secs(60))
}
