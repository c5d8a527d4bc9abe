use std::fmt::{Display, Formatter};

use serde_json::Value;
use thiserror::Error;

/// Validation errors raised before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("address cannot be empty")]
    EmptyAddress,
    #[error("address length {len} is outside the accepted range {min}..={max}")]
    AddressBadLength { len: usize, min: usize, max: usize },
    #[error("address contains invalid character '{ch}' at index {index}")]
    AddressInvalidChar { ch: char, index: usize },

    #[error("txid must be 64 hex characters, got {len}")]
    TxidBadLength { len: usize },
    #[error("txid contains non-hex character '{ch}' at index {index}")]
    TxidInvalidChar { ch: char, index: usize },

    #[error("asset ticker cannot be empty")]
    EmptyTicker,
    #[error("asset ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("asset ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("name cannot be empty")]
    EmptyName,
    #[error("name length {len} exceeds max {max}")]
    NameTooLong { len: usize, max: usize },
    #[error("name contains invalid character '{ch}' at index {index}")]
    NameInvalidChar { ch: char, index: usize },

    #[error("invalid network '{value}', expected one of mainnet, testnet, signet, regtest")]
    InvalidNetwork { value: String },

    #[error("raw transaction hex cannot be empty")]
    EmptyRawTx,
    #[error("raw transaction hex must have even length, got {len}")]
    RawTxOddLength { len: usize },
    #[error("raw transaction contains non-hex character '{ch}' at index {index}")]
    RawTxInvalidChar { ch: char, index: usize },

    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Failure classification used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection-level failure: refused, reset, DNS.
    Transport,
    /// A request phase timed out.
    Timeout,
    /// Body could not be parsed as JSON, even after decompression attempts.
    Decode,
    /// Transport delivered a 4xx/5xx status.
    HttpStatus,
    /// Well-formed envelope with a non-zero protocol code.
    Application,
    /// Malformed input rejected before any network call.
    Validation,
    /// The client was closed.
    Closed,
    /// Fallback bucket.
    Unknown,
}

// Internal sentinel codes for failures that carry no protocol or HTTP code.
pub const CODE_TRANSPORT: i64 = -1;
pub const CODE_TIMEOUT: i64 = -2;
pub const CODE_DECODE: i64 = -3;
pub const CODE_VALIDATION: i64 = -4;
pub const CODE_CLOSED: i64 = -5;
pub const CODE_BATCH: i64 = -6;
pub const CODE_UNKNOWN: i64 = -9;

/// Structured error returned by every operation in this crate.
///
/// Constructed exactly once at the point of failure and propagated unchanged;
/// callers never see a raw reqwest/serde/flate2 error.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    kind: ErrorKind,
    code: i64,
    message: String,
    data: Option<Value>,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            code: CODE_TRANSPORT,
            message: message.into(),
            data: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            code: CODE_TIMEOUT,
            message: message.into(),
            data: None,
        }
    }

    pub fn decode(message: impl Into<String>, diagnostics: Value) -> Self {
        Self {
            kind: ErrorKind::Decode,
            code: CODE_DECODE,
            message: message.into(),
            data: Some(diagnostics),
        }
    }

    pub fn http_status(status: u16) -> Self {
        Self {
            kind: ErrorKind::HttpStatus,
            code: i64::from(status),
            message: format!("upstream returned status {status}"),
            data: None,
        }
    }

    pub fn application(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            kind: ErrorKind::Application,
            code,
            message: message.into(),
            data,
        }
    }

    pub fn closed() -> Self {
        Self {
            kind: ErrorKind::Closed,
            code: CODE_CLOSED,
            message: String::from("client is closed"),
            data: None,
        }
    }

    pub fn batch(failures: Vec<(usize, ApiError)>, total: usize) -> Self {
        let detail = failures
            .iter()
            .map(|(position, error)| {
                serde_json::json!({
                    "position": position,
                    "code": error.code(),
                    "message": error.message(),
                })
            })
            .collect::<Vec<_>>();

        Self {
            kind: ErrorKind::Unknown,
            code: CODE_BATCH,
            message: format!("batch failed: {} of {total} calls failed", failures.len()),
            data: Some(Value::Array(detail)),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: CODE_UNKNOWN,
            message: message.into(),
            data: None,
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Transport, timeout, and 5xx failures are transient; everything else
    /// is a definite rejection.
    pub const fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Transport | ErrorKind::Timeout => true,
            ErrorKind::HttpStatus => self.code >= 500,
            ErrorKind::Decode
            | ErrorKind::Application
            | ErrorKind::Validation
            | ErrorKind::Closed
            | ErrorKind::Unknown => false,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self {
            kind: ErrorKind::Validation,
            code: CODE_VALIDATION,
            message: error.to_string(),
            data: None,
        }
    }
}
