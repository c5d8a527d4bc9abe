use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::retry::Backoff;

/// Networks the index API serves under `{chain}/{network}/...` paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl Network {
    pub const ALL: [Self; 4] = [Self::Mainnet, Self::Testnet, Self::Signet, Self::Regtest];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Signet => "signet",
            Self::Regtest => "regtest",
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            other => Err(ValidationError::InvalidNetwork {
                value: other.to_owned(),
            }),
        }
    }
}

/// Client configuration consumed by the request engine and transport manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub network: Network,
    /// Applied separately to the connect and read phases of each request.
    pub timeout: Duration,
    /// Total attempts per logical call, including the first.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Extra headers attached to every request.
    pub headers: BTreeMap<String, String>,
    pub connection_pool_size: usize,
    pub keep_alive: Option<Duration>,
    pub compression_enabled: bool,
    pub accepted_encodings: Vec<String>,
    pub cache_enabled: bool,
    pub cache_max_age: Duration,
    pub metrics_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.satquery.io"),
            network: Network::Mainnet,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff: Backoff::default(),
            headers: BTreeMap::new(),
            connection_pool_size: 8,
            keep_alive: Some(Duration::from_secs(60)),
            compression_enabled: true,
            accepted_encodings: vec![String::from("gzip"), String::from("deflate")],
            cache_enabled: true,
            cache_max_age: Duration::from_secs(300),
            metrics_enabled: true,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, network: Network) -> Self {
        Self {
            base_url: base_url.into(),
            network,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_pool_size(mut self, connection_pool_size: usize) -> Self {
        self.connection_pool_size = connection_pool_size;
        self
    }

    pub fn with_cache(mut self, enabled: bool, max_age: Duration) -> Self {
        self.cache_enabled = enabled;
        self.cache_max_age = max_age;
        self
    }

    pub fn without_compression(mut self) -> Self {
        self.compression_enabled = false;
        self
    }

    /// Effective cache max-age: zero when caching is disabled, which makes
    /// the cache degrade to a pass-through.
    pub fn effective_cache_max_age(&self) -> Duration {
        if self.cache_enabled {
            self.cache_max_age
        } else {
            Duration::ZERO
        }
    }
}

/// Partial update applied over a live configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    pub base_url: Option<String>,
    pub network: Option<Network>,
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
    pub backoff: Option<Backoff>,
    pub headers: Option<BTreeMap<String, String>>,
    pub connection_pool_size: Option<usize>,
    pub keep_alive: Option<Option<Duration>>,
    pub compression_enabled: Option<bool>,
    pub accepted_encodings: Option<Vec<String>>,
    pub cache_enabled: Option<bool>,
    pub cache_max_age: Option<Duration>,
    pub metrics_enabled: Option<bool>,
}

impl ConfigUpdate {
    /// Applies the update in place. Returns `true` when the change affects
    /// the connection pool and the transport must be rebuilt.
    pub fn apply(self, config: &mut ClientConfig) -> bool {
        let mut rebuild_pool = false;

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(timeout) = self.timeout {
            rebuild_pool |= config.timeout != timeout;
            config.timeout = timeout;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(backoff) = self.backoff {
            config.backoff = backoff;
        }
        if let Some(headers) = self.headers {
            config.headers = headers;
        }
        if let Some(pool_size) = self.connection_pool_size {
            rebuild_pool |= config.connection_pool_size != pool_size;
            config.connection_pool_size = pool_size;
        }
        if let Some(keep_alive) = self.keep_alive {
            rebuild_pool |= config.keep_alive != keep_alive;
            config.keep_alive = keep_alive;
        }
        if let Some(compression_enabled) = self.compression_enabled {
            config.compression_enabled = compression_enabled;
        }
        if let Some(accepted_encodings) = self.accepted_encodings {
            config.accepted_encodings = accepted_encodings;
        }
        if let Some(cache_enabled) = self.cache_enabled {
            config.cache_enabled = cache_enabled;
        }
        if let Some(cache_max_age) = self.cache_max_age {
            config.cache_max_age = cache_max_age;
        }
        if let Some(metrics_enabled) = self.metrics_enabled {
            config.metrics_enabled = metrics_enabled;
        }

        rebuild_pool
    }
}
