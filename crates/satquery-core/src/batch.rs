//! Concurrent fan-out of many logical calls through one request engine.
//!
//! Batched calls share the engine's cache and connection pool, so repeated
//! or overlapping batches get dedup and reuse with no extra machinery here.

use serde_json::Value;

use crate::client::ApiClient;
use crate::domain::{Address, AssetTicker, BnsName, Txid};
use crate::error::ApiError;
use crate::retry::settle_all;

/// One logical call in a batch: a closed set of read-only operations, each
/// variant carrying its validated parameters. Broadcast is deliberately not
/// batchable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCall {
    AddressSummary(Address),
    AddressBalance(Address),
    AddressUtxos(Address),
    Transaction(Txid),
    AssetInfo(AssetTicker),
    ResolveName(BnsName),
}

impl BatchCall {
    pub(crate) fn path(&self) -> String {
        match self {
            Self::AddressSummary(address) => format!("address/{address}/summary"),
            Self::AddressBalance(address) => format!("address/{address}/balance"),
            Self::AddressUtxos(address) => format!("address/{address}/utxo"),
            Self::Transaction(txid) => format!("tx/{txid}"),
            Self::AssetInfo(ticker) => format!("asset/{ticker}/info"),
            Self::ResolveName(name) => format!("ns/name/{name}"),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::AddressSummary(_) => "address_summary",
            Self::AddressBalance(_) => "address_balance",
            Self::AddressUtxos(_) => "address_utxos",
            Self::Transaction(_) => "transaction",
            Self::AssetInfo(_) => "asset_info",
            Self::ResolveName(_) => "resolve_name",
        }
    }
}

impl ApiClient {
    /// Runs every call concurrently and returns the payloads in input order.
    ///
    /// Policy: aggregate-then-fail. All calls run to completion (a failing
    /// call never cancels its siblings); if any failed, the batch returns a
    /// single [`ApiError`] whose diagnostic payload lists every failure with
    /// its position, code, and message.
    pub async fn batch(&self, calls: &[BatchCall]) -> Result<Vec<Value>, ApiError> {
        let futures = calls
            .iter()
            .map(|call| self.get_value_owned(call.path()))
            .collect::<Vec<_>>();

        let settled = settle_all(futures).await;

        let total = settled.len();
        let mut values = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (position, outcome) in settled.into_iter().enumerate() {
            match outcome {
                Ok(value) => values.push(value),
                Err(error) => failures.push((position, error)),
            }
        }

        if failures.is_empty() {
            Ok(values)
        } else {
            Err(ApiError::batch(failures, total))
        }
    }

    async fn get_value_owned(&self, path: String) -> Result<Value, ApiError> {
        self.get_value(&path, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address::parse("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").expect("valid address")
    }

    #[test]
    fn paths_follow_the_resource_conventions() {
        assert_eq!(
            BatchCall::AddressUtxos(address()).path(),
            "address/bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4/utxo"
        );
        assert_eq!(
            BatchCall::ResolveName(BnsName::parse("alice").expect("valid")).path(),
            "ns/name/alice"
        );
        assert_eq!(
            BatchCall::AssetInfo(AssetTicker::parse("ordi").expect("valid")).path(),
            "asset/ORDI/info"
        );
    }

    #[test]
    fn labels_cover_every_variant() {
        let txid = Txid::parse(&"ab".repeat(32)).expect("valid");
        assert_eq!(BatchCall::Transaction(txid).label(), "transaction");
        assert_eq!(BatchCall::AddressSummary(address()).label(), "address_summary");
    }
}
