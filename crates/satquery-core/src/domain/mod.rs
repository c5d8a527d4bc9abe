//! Validated domain identifiers used by the typed facade.

mod address;
mod asset;
mod name;

pub use address::{Address, Txid};
pub use asset::AssetTicker;
pub use name::BnsName;
