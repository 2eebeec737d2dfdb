//! Sign documents handed to the wallet extension
//!
//! Amino signing takes a JSON `StdSignDoc`; the signed bytes are its
//! canonical form (sorted keys, no whitespace). Direct signing takes the
//! protobuf `SignDoc` fields.

use serde::{Deserialize, Serialize};
use terpdash_core::{RawAmount, TxError};

/// Coin in amino JSON (amount as a string)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AminoCoin {
    pub denom: String,
    pub amount: String,
}

impl AminoCoin {
    pub fn new(denom: impl Into<String>, amount: RawAmount) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }
}

/// Message in amino JSON: `{"type": ..., "value": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AminoMsg {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

/// Fee in amino JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<AminoCoin>,
    pub gas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl StdFee {
    pub fn new(amount: Vec<AminoCoin>, gas: u64) -> Self {
        Self {
            amount,
            gas: gas.to_string(),
            granter: None,
            payer: None,
        }
    }

    pub fn with_granter(mut self, granter: Option<String>) -> Self {
        self.granter = granter;
        self
    }

    pub fn gas_limit(&self) -> Result<u64, TxError> {
        self.gas.parse().map_err(|_| TxError::BuildFailed {
            message: format!("invalid gas '{}'", self.gas),
        })
    }
}

/// Amino sign document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignDoc {
    pub chain_id: String,
    pub account_number: String,
    pub sequence: String,
    pub fee: StdFee,
    pub msgs: Vec<AminoMsg>,
    pub memo: String,
}

impl StdSignDoc {
    pub fn new(
        chain_id: &str,
        account_number: u64,
        sequence: u64,
        fee: StdFee,
        msgs: Vec<AminoMsg>,
        memo: &str,
    ) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            account_number: account_number.to_string(),
            sequence: sequence.to_string(),
            fee,
            msgs,
            memo: memo.to_string(),
        }
    }

    /// Canonical JSON with every object's keys sorted
    pub fn to_sorted_json(&self) -> Result<Vec<u8>, TxError> {
        // `Value` objects are BTreeMap-backed, so round-tripping sorts keys.
        let value = serde_json::to_value(self).map_err(|e| TxError::EncodeFailed {
            message: e.to_string(),
        })?;
        serde_json::to_vec(&value).map_err(|e| TxError::EncodeFailed {
            message: e.to_string(),
        })
    }

    pub fn sequence_number(&self) -> Result<u64, TxError> {
        self.sequence.parse().map_err(|_| TxError::BuildFailed {
            message: format!("invalid sequence '{}'", self.sequence),
        })
    }
}

/// Fields of the protobuf `SignDoc` for direct signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectSignDoc {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub chain_id: String,
    pub account_number: u64,
}

impl DirectSignDoc {
    /// Protobuf-encoded `SignDoc`
    pub fn sign_bytes(&self) -> Vec<u8> {
        use prost::Message;
        cosmos_sdk_proto::cosmos::tx::v1beta1::SignDoc {
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
            chain_id: self.chain_id.clone(),
            account_number: self.account_number,
        }
        .encode_to_vec()
    }
}
