//! Transaction body, auth info and `TxRaw` assembly

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin as ProtoCoin;
use cosmos_sdk_proto::cosmos::crypto::secp256k1::PubKey;
use cosmos_sdk_proto::cosmos::tx::signing::v1beta1::SignMode;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{
    mode_info, AuthInfo, Fee, ModeInfo, SignerInfo, TxBody, TxRaw,
};
use prost::Message;
use prost_types::Any;
use terpdash_core::TxError;

use crate::msgs::BridgeMsg;
use crate::sign_doc::{StdFee, StdSignDoc};

/// Type URL of a standard Cosmos secp256k1 key
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// Fee fields of `AuthInfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSpec {
    pub denom: String,
    pub amount: u128,
    pub gas_limit: u64,
    pub granter: Option<String>,
}

impl FeeSpec {
    fn to_proto(&self) -> Fee {
        Fee {
            amount: vec![ProtoCoin {
                denom: self.denom.clone(),
                amount: self.amount.to_string(),
            }],
            gas_limit: self.gas_limit,
            granter: self.granter.clone().unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Wrap compressed public key bytes in an `Any` with the given type URL
///
/// Ethermint forks register their own key type under a different URL but
/// keep the `{ key: bytes }` wire shape.
pub fn pubkey_any(type_url: &str, key: &[u8]) -> Any {
    Any {
        type_url: type_url.to_string(),
        value: PubKey { key: key.to_vec() }.encode_to_vec(),
    }
}

pub fn encode_body(msgs: &[BridgeMsg], memo: &str) -> Vec<u8> {
    TxBody {
        messages: msgs.iter().map(BridgeMsg::to_any).collect(),
        memo: memo.to_string(),
        ..Default::default()
    }
    .encode_to_vec()
}

pub fn encode_auth_info(pubkey: Any, sequence: u64, mode: SignMode, fee: &FeeSpec) -> Vec<u8> {
    let signer = SignerInfo {
        public_key: Some(pubkey),
        mode_info: Some(ModeInfo {
            sum: Some(mode_info::Sum::Single(mode_info::Single { mode: mode as i32 })),
        }),
        sequence,
    };
    AuthInfo {
        signer_infos: vec![signer],
        fee: Some(fee.to_proto()),
        ..Default::default()
    }
    .encode_to_vec()
}

/// Serialize a signed transaction for broadcasting
pub fn assemble(body_bytes: Vec<u8>, auth_info_bytes: Vec<u8>, signature: Vec<u8>) -> Vec<u8> {
    TxRaw {
        body_bytes,
        auth_info_bytes,
        signatures: vec![signature],
    }
    .encode_to_vec()
}

pub fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, TxError> {
    BASE64.decode(value).map_err(|e| TxError::BadSignature {
        message: format!("{} is not valid base64: {}", field, e),
    })
}

fn fee_from_std(fee: &StdFee) -> Result<FeeSpec, TxError> {
    let coin = fee.amount.first();
    Ok(FeeSpec {
        denom: coin.map(|c| c.denom.clone()).unwrap_or_default(),
        amount: match coin {
            Some(c) => c.amount.parse().map_err(|_| TxError::BuildFailed {
                message: format!("invalid fee amount '{}'", c.amount),
            })?,
            None => 0,
        },
        gas_limit: fee.gas_limit()?,
        granter: fee.granter.clone(),
    })
}

/// Build `TxRaw` from an amino signature
///
/// The wallet may adjust fee or memo before signing, so the body and auth
/// info are rebuilt from the document it actually signed.
pub fn amino_tx_raw(
    msgs: &[BridgeMsg],
    signed: &StdSignDoc,
    pubkey: &[u8],
    signature: &[u8],
) -> Result<Vec<u8>, TxError> {
    if signature.is_empty() {
        return Err(TxError::BadSignature {
            message: "empty signature".to_string(),
        });
    }
    let body = encode_body(msgs, &signed.memo);
    let auth_info = encode_auth_info(
        pubkey_any(SECP256K1_PUBKEY_TYPE_URL, pubkey),
        signed.sequence_number()?,
        SignMode::LegacyAminoJson,
        &fee_from_std(&signed.fee)?,
    );
    Ok(assemble(body, auth_info, signature.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgs::IbcTransfer;
    use crate::sign_doc::AminoCoin;

    fn msgs() -> Vec<BridgeMsg> {
        vec![BridgeMsg::Transfer(IbcTransfer {
            source_channel: "channel-2".into(),
            denom: "uterp".into(),
            amount: 10,
            sender: "terp1sender".into(),
            receiver: "osmo1receiver".into(),
            timeout_timestamp_ns: 1,
        })]
    }

    #[test]
    fn test_amino_tx_raw_carries_signed_fee() {
        let signed = StdSignDoc::new(
            "morocco-1",
            5,
            9,
            StdFee::new(vec![AminoCoin::new("uthiol", 15_000)], 150_000)
                .with_granter(Some("terp1faucet".into())),
            msgs().iter().map(BridgeMsg::to_amino).collect(),
            "",
        );
        let raw = amino_tx_raw(&msgs(), &signed, &[2u8; 33], &[7u8; 64]).unwrap();

        let tx = TxRaw::decode(raw.as_slice()).unwrap();
        assert_eq!(tx.signatures, vec![vec![7u8; 64]]);

        let auth = AuthInfo::decode(tx.auth_info_bytes.as_slice()).unwrap();
        let fee = auth.fee.unwrap();
        assert_eq!(fee.gas_limit, 150_000);
        assert_eq!(fee.granter, "terp1faucet");
        assert_eq!(fee.amount[0].amount, "15000");

        let signer = &auth.signer_infos[0];
        assert_eq!(signer.sequence, 9);
        assert_eq!(
            signer.public_key.as_ref().unwrap().type_url,
            SECP256K1_PUBKEY_TYPE_URL
        );
        match signer.mode_info.as_ref().unwrap().sum.as_ref().unwrap() {
            mode_info::Sum::Single(single) => {
                assert_eq!(single.mode, SignMode::LegacyAminoJson as i32)
            }
            other => panic!("unexpected mode info {:?}", other),
        }

        let body = TxBody::decode(tx.body_bytes.as_slice()).unwrap();
        assert_eq!(body.messages.len(), 1);
    }

    #[test]
    fn test_empty_signature_rejected() {
        let signed = StdSignDoc::new("morocco-1", 0, 0, StdFee::new(vec![], 1), vec![], "");
        assert!(matches!(
            amino_tx_raw(&msgs(), &signed, &[2u8; 33], &[]),
            Err(TxError::BadSignature { .. })
        ));
    }

    #[test]
    fn test_bad_base64() {
        assert!(decode_base64("signature", "***").is_err());
        assert_eq!(decode_base64("signature", "AQI=").unwrap(), vec![1, 2]);
    }
}
