//! Scripted wallet for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_registry::Chain;
use ibc_tx::{DirectSignDoc, StdSignDoc};
use terpdash_core::WalletError;
use wallet_bridge::{
    AminoSignResponse, DirectSignResponse, SignaturePubKey, SignedDirectDoc, StdSignature,
    WalletKey, WalletSigner,
};

pub(crate) const PUBKEY: [u8; 33] = [2u8; 33];
pub(crate) const SIGNATURE: [u8; 64] = [7u8; 64];

/// Approves everything and counts what it was asked
#[derive(Default)]
pub(crate) struct MockWallet {
    pub connects: AtomicUsize,
    pub amino_signs: AtomicUsize,
    pub direct_signs: AtomicUsize,
    pub last_amino: Mutex<Option<StdSignDoc>>,
    pub last_is_ethereum: Mutex<Option<bool>>,
}

impl MockWallet {
    pub fn key_for(chain: &Chain) -> WalletKey {
        WalletKey {
            chain_id: chain.chain_id.clone(),
            address: format!("{}1tester", chain.bech32_prefix),
            pub_key: BASE64.encode(PUBKEY),
            name: "tester".into(),
            algo: if chain.family.is_ethermint() {
                "ethsecp256k1".into()
            } else {
                "secp256k1".into()
            },
        }
    }

    pub fn signs(&self) -> usize {
        self.amino_signs.load(Ordering::SeqCst) + self.direct_signs.load(Ordering::SeqCst)
    }

    fn signature() -> StdSignature {
        StdSignature {
            pub_key: SignaturePubKey {
                kind: "tendermint/PubKeySecp256k1".into(),
                value: BASE64.encode(PUBKEY),
            },
            signature: BASE64.encode(SIGNATURE),
        }
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    async fn connect(&self, chain: &Chain) -> Result<WalletKey, WalletError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Self::key_for(chain))
    }

    async fn sign_amino(
        &self,
        _chain_id: &str,
        _signer: &str,
        doc: &StdSignDoc,
    ) -> Result<AminoSignResponse, WalletError> {
        self.amino_signs.fetch_add(1, Ordering::SeqCst);
        *self.last_amino.lock().unwrap() = Some(doc.clone());
        Ok(AminoSignResponse {
            signed: doc.clone(),
            signature: Self::signature(),
        })
    }

    async fn sign_direct(
        &self,
        _signer: &str,
        doc: &DirectSignDoc,
        is_ethereum: bool,
    ) -> Result<DirectSignResponse, WalletError> {
        self.direct_signs.fetch_add(1, Ordering::SeqCst);
        *self.last_is_ethereum.lock().unwrap() = Some(is_ethereum);
        Ok(DirectSignResponse {
            signed: SignedDirectDoc {
                body_bytes: BASE64.encode(&doc.body_bytes),
                auth_info_bytes: BASE64.encode(&doc.auth_info_bytes),
                chain_id: doc.chain_id.clone(),
                account_number: doc.account_number.to_string(),
            },
            signature: Self::signature(),
        })
    }
}
