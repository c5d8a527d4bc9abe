//! Response payload shapes for the typed facade. Plain serde structs; the
//! engine delivers untyped JSON and these give it a name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregate view of one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSummary {
    pub address: String,
    pub tx_count: u64,
    pub funded_sum: u64,
    pub spent_sum: u64,
    #[serde(default)]
    pub first_seen_height: Option<u64>,
}

/// Confirmed/unconfirmed balance in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBalance {
    pub confirmed: u64,
    /// Net mempool delta; negative when unconfirmed spends outweigh funds.
    pub unconfirmed: i64,
}

/// One spendable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub script_pubkey: Option<String>,
}

/// Transaction detail as the index reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDetail {
    pub txid: String,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub fee: Option<u64>,
    pub vin_count: u32,
    pub vout_count: u32,
    pub confirmed: bool,
}

/// Asset issuance summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub ticker: String,
    pub supply: u64,
    pub holders: u64,
    #[serde(default)]
    pub deploy_height: Option<u64>,
    #[serde(default)]
    pub deploy_txid: Option<String>,
}

/// One holder row of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetHolder {
    pub address: String,
    pub amount: u64,
}

/// Naming-service record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameRecord {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub expires_height: Option<u64>,
    #[serde(default)]
    pub records: BTreeMap<String, String>,
}

/// Result of submitting a raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResult {
    pub txid: String,
}
