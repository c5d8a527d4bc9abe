//! Typed facade: one validated, normalized engine call per domain operation.

use serde_json::json;

use crate::client::ApiClient;
use crate::domain::{Address, AssetTicker, BnsName, Txid};
use crate::error::{ApiError, ValidationError};
use crate::models::{
    AddressBalance, AddressSummary, AssetHolder, AssetInfo, BroadcastResult, NameRecord, TxDetail,
    Utxo,
};

impl ApiClient {
    pub async fn address_summary(&self, address: &Address) -> Result<AddressSummary, ApiError> {
        self.get(&format!("address/{address}/summary"), &[]).await
    }

    pub async fn address_balance(&self, address: &Address) -> Result<AddressBalance, ApiError> {
        self.get(&format!("address/{address}/balance"), &[]).await
    }

    pub async fn address_utxos(&self, address: &Address) -> Result<Vec<Utxo>, ApiError> {
        self.get(&format!("address/{address}/utxo"), &[]).await
    }

    pub async fn transaction(&self, txid: &Txid) -> Result<TxDetail, ApiError> {
        self.get(&format!("tx/{txid}"), &[]).await
    }

    /// Submits a raw transaction. Never cached ahead of time by callers;
    /// the engine still applies its uniform pipeline.
    pub async fn broadcast_tx(&self, raw_hex: &str) -> Result<BroadcastResult, ApiError> {
        let raw_hex = validate_raw_tx(raw_hex)?;
        self.post("tx/broadcast", json!({ "rawtx": raw_hex })).await
    }

    pub async fn asset_info(&self, ticker: &AssetTicker) -> Result<AssetInfo, ApiError> {
        self.get(&format!("asset/{ticker}/info"), &[]).await
    }

    pub async fn asset_holders(
        &self,
        ticker: &AssetTicker,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<AssetHolder>, ApiError> {
        if page_size == 0 {
            return Err(ValidationError::ZeroPageSize.into());
        }

        let page = page.to_string();
        let size = page_size.to_string();
        self.get(
            &format!("asset/{ticker}/holders"),
            &[("page", page.as_str()), ("size", size.as_str())],
        )
        .await
    }

    pub async fn resolve_name(&self, name: &BnsName) -> Result<NameRecord, ApiError> {
        self.get(&format!("ns/name/{name}"), &[]).await
    }

    pub async fn names_of_address(&self, address: &Address) -> Result<Vec<NameRecord>, ApiError> {
        self.get(&format!("ns/address/{address}"), &[]).await
    }
}

fn validate_raw_tx(raw_hex: &str) -> Result<String, ValidationError> {
    let trimmed = raw_hex.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyRawTx);
    }

    let len = trimmed.chars().count();
    if len % 2 != 0 {
        return Err(ValidationError::RawTxOddLength { len });
    }

    for (index, ch) in trimmed.chars().enumerate() {
        if !ch.is_ascii_hexdigit() {
            return Err(ValidationError::RawTxInvalidChar { ch, index });
        }
    }

    Ok(trimmed.to_ascii_lowercase())
}
