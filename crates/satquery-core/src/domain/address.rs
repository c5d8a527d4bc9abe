use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MIN_ADDRESS_LEN: usize = 14;
const MAX_ADDRESS_LEN: usize = 74;
const BECH32_PREFIXES: [&str; 3] = ["bc1", "tb1", "bcrt1"];

/// Shape-validated Bitcoin address.
///
/// Validation covers character set and length only; checksum semantics are
/// the server's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyAddress);
        }

        let len = trimmed.chars().count();
        if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
            return Err(ValidationError::AddressBadLength {
                len,
                min: MIN_ADDRESS_LEN,
                max: MAX_ADDRESS_LEN,
            });
        }

        let lowered = trimmed.to_ascii_lowercase();
        if BECH32_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            // Bech32 is case-insensitive on the wire; normalize to lowercase.
            for (index, ch) in lowered.chars().enumerate() {
                if !is_bech32_char(ch) {
                    return Err(ValidationError::AddressInvalidChar { ch, index });
                }
            }
            return Ok(Self(lowered));
        }

        for (index, ch) in trimmed.chars().enumerate() {
            if !is_base58_char(ch) {
                return Err(ValidationError::AddressInvalidChar { ch, index });
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_bech32_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit()
}

fn is_base58_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() && !matches!(ch, '0' | 'O' | 'I' | 'l')
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Address {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// 64-hex-character transaction id, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Txid(String);

impl Txid {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let len = trimmed.chars().count();
        if len != 64 {
            return Err(ValidationError::TxidBadLength { len });
        }

        for (index, ch) in trimmed.chars().enumerate() {
            if !ch.is_ascii_hexdigit() {
                return Err(ValidationError::TxidInvalidChar { ch, index });
            }
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Txid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Txid {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Txid> for String {
    fn from(value: Txid) -> Self {
        value.0
    }
}
