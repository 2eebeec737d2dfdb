//! Core type definitions for terpdash

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cosmos chain ID (e.g. "morocco-1", "osmosis-1")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (uppercase hex as returned by the LCD)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bech32 account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable part of the address (everything before the last '1').
    pub fn prefix(&self) -> Option<&str> {
        self.0.rfind('1').map(|i| &self.0[..i]).filter(|p| !p.is_empty())
    }

    /// Check the address carries the expected bech32 prefix
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix() == Some(prefix)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of an IBC transfer relative to the home chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Counterparty chain -> home chain
    Deposit,
    /// Home chain -> counterparty chain
    Withdrawal,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }

    /// The opposite direction (the "switch chains" toggle)
    pub fn toggled(&self) -> Self {
        match self {
            Self::Deposit => Self::Withdrawal,
            Self::Withdrawal => Self::Deposit,
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw on-chain token amount (base units)
pub type RawAmount = u128;

/// Block height
pub type BlockHeight = u64;

/// Constants
pub mod constants {
    /// IBC transfer port on every chain we talk to
    pub const TRANSFER_PORT: &str = "transfer";

    /// IBC timeout applied to every transfer (seconds)
    pub const IBC_TIMEOUT_SECS: u64 = 10 * 60;

    /// Gas price used for home-chain withdrawals
    pub const WITHDRAW_GAS_PRICE: f64 = 0.1;
}
