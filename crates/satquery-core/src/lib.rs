//! # Satquery Core
//!
//! Typed async request layer for Bitcoin UTXO-index HTTP APIs: address,
//! UTXO, asset, and naming-service lookups over a `{code, msg, data}`
//! envelope protocol.
//!
//! The interesting part is the request engine. Each logical call runs one
//! pipeline: identity → cache → pooled transport → defensive decode →
//! envelope unwrap → cache store → metrics, with transient failures retried
//! under a configurable backoff. Batches fan the same pipeline out
//! concurrently with per-call failure isolation.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | The request engine (`ApiClient`) |
//! | [`batch`] | Batch calls and the fan-out orchestrator |
//! | [`cache`] | Time-expiring response cache |
//! | [`transport`] | Connection pool and the raw send primitive |
//! | [`retry`] | Backoff policy and non-throwing execution helpers |
//! | [`decode`] | Two-tier JSON/compressed body decoding |
//! | [`envelope`] | Protocol envelope unwrap rule |
//! | [`error`] | `ApiError` and validation errors |
//! | [`config`] | Client configuration and runtime updates |
//! | [`domain`] | Validated identifiers (addresses, txids, tickers, names) |
//! | [`models`] | Typed response payloads |
//! | [`metrics`] | Request counters and pool gauges |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use satquery_core::{Address, ApiClient, ClientConfig, Network};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ClientConfig::new(
//!         "https://index.example.org",
//!         Network::Mainnet,
//!     ))?;
//!
//!     let address = Address::parse("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")?;
//!     let utxos = client.address_utxos(&address).await?;
//!     println!("{} spendable outputs", utxos.len());
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns `Result<T, ApiError>`; callers never see a raw
//! reqwest/serde error. Transport failures, timeouts, and 5xx statuses are
//! retried with backoff; 4xx statuses and envelope rejections (`code != 0`)
//! are definite and surface immediately.

pub mod api;
pub mod batch;
pub mod cache;
pub mod client;
pub mod config;
pub mod decode;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod retry;
pub mod transport;

// Re-export commonly used types at crate root for convenience

pub use batch::BatchCall;
pub use cache::{CacheStats, ResponseCache};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigUpdate, Network};
pub use domain::{Address, AssetTicker, BnsName, Txid};
pub use envelope::Envelope;
pub use error::{ApiError, ErrorKind, ValidationError};
pub use identity::RequestIdentity;
pub use metrics::MetricsSnapshot;
pub use models::{
    AddressBalance, AddressSummary, AssetHolder, AssetInfo, BroadcastResult, NameRecord, TxDetail,
    Utxo,
};
pub use retry::{partition_settled, retry_with_backoff, settle_all, with_default, Backoff};
pub use transport::{
    HttpMethod, HttpTransport, PoolSettings, RawResponse, ReqwestTransport, TransportRequest,
};
