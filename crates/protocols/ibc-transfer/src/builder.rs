//! Signed transaction builders, one per signing family
//!
//! Both builders read `account_number`/`sequence` from the source chain, have
//! the wallet sign and return `TxRaw` bytes ready for broadcast.

use async_trait::async_trait;
use chain_registry::{Chain, SigningFamily};
use ibc_tx::{
    amino_tx_raw, assemble, encode_auth_info, encode_body, pubkey_any, AminoCoin, BridgeMsg,
    DirectSignDoc, FeeSpec, SignMode, StdFee, StdSignDoc,
};
use lcd_client::LcdClient;
use terpdash_core::TransferError;
use wallet_bridge::{WalletKey, WalletSigner};

/// Everything needed to produce one signed transaction
#[derive(Debug, Clone)]
pub struct SignRequest<'a> {
    pub chain: &'a Chain,
    pub key: &'a WalletKey,
    pub msgs: Vec<BridgeMsg>,
    pub fee: FeeSpec,
    pub memo: String,
}

#[async_trait]
pub trait TransferBuilder: Send + Sync {
    /// Sign `request` with `wallet` and return encoded `TxRaw`
    async fn sign(
        &self,
        request: &SignRequest<'_>,
        lcd: &LcdClient,
        wallet: &dyn WalletSigner,
    ) -> Result<Vec<u8>, TransferError>;
}

/// Builder for the chain's signing family
pub fn builder_for(family: &SigningFamily) -> Box<dyn TransferBuilder> {
    match family {
        SigningFamily::Amino => Box::new(AminoTransferBuilder),
        SigningFamily::Ethermint {
            pubkey_type_url, ..
        } => Box::new(EthermintTransferBuilder {
            pubkey_type_url: pubkey_type_url.clone(),
        }),
    }
}

/// Legacy amino JSON signing
#[derive(Debug, Clone, Copy, Default)]
pub struct AminoTransferBuilder;

#[async_trait]
impl TransferBuilder for AminoTransferBuilder {
    async fn sign(
        &self,
        request: &SignRequest<'_>,
        lcd: &LcdClient,
        wallet: &dyn WalletSigner,
    ) -> Result<Vec<u8>, TransferError> {
        let account = lcd.account(&request.key.address).await?;
        let fee = StdFee::new(
            vec![AminoCoin::new(&request.fee.denom, request.fee.amount)],
            request.fee.gas_limit,
        )
        .with_granter(request.fee.granter.clone());
        let doc = StdSignDoc::new(
            &request.chain.chain_id,
            account.account_number,
            account.sequence,
            fee,
            request.msgs.iter().map(BridgeMsg::to_amino).collect(),
            &request.memo,
        );

        tracing::debug!(
            chain_id = %request.chain.chain_id,
            account_number = account.account_number,
            sequence = account.sequence,
            "Requesting amino signature"
        );
        let signed = wallet
            .sign_amino(&request.chain.chain_id, &request.key.address, &doc)
            .await?;

        Ok(amino_tx_raw(
            &request.msgs,
            &signed.signed,
            &signed.signature.pub_key_bytes()?,
            &signed.signature.signature_bytes()?,
        )?)
    }
}

/// Direct signing for Ethermint accounts
///
/// The key is wrapped in the chain's own `ethsecp256k1` type URL and the
/// wallet is told to sign as an Ethereum account.
#[derive(Debug, Clone)]
pub struct EthermintTransferBuilder {
    pub pubkey_type_url: String,
}

#[async_trait]
impl TransferBuilder for EthermintTransferBuilder {
    async fn sign(
        &self,
        request: &SignRequest<'_>,
        lcd: &LcdClient,
        wallet: &dyn WalletSigner,
    ) -> Result<Vec<u8>, TransferError> {
        let account = lcd.account(&request.key.address).await?;
        let pubkey = request.key.pub_key_bytes()?;

        let doc = DirectSignDoc {
            body_bytes: encode_body(&request.msgs, &request.memo),
            auth_info_bytes: encode_auth_info(
                pubkey_any(&self.pubkey_type_url, &pubkey),
                account.sequence,
                SignMode::Direct,
                &request.fee,
            ),
            chain_id: request.chain.chain_id.clone(),
            account_number: account.account_number,
        };

        tracing::debug!(
            chain_id = %request.chain.chain_id,
            account_number = account.account_number,
            sequence = account.sequence,
            type_url = %self.pubkey_type_url,
            "Requesting direct signature"
        );
        let signed = wallet
            .sign_direct(&request.key.address, &doc, true)
            .await?;

        Ok(assemble(
            signed.body_bytes()?,
            signed.auth_info_bytes()?,
            signed.signature.signature_bytes()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockWallet, SIGNATURE};
    use chain_registry::constants::ETHERMINT_PUBKEY_TYPE_URL;
    use chain_registry::Registry;
    use cosmos_sdk_proto::cosmos::tx::v1beta1::{mode_info, AuthInfo, TxRaw};
    use ibc_tx::IbcTransfer;
    use prost::Message;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transfer(sender: &str) -> Vec<BridgeMsg> {
        vec![BridgeMsg::Transfer(IbcTransfer {
            source_channel: "channel-77".into(),
            denom: "aevmos".into(),
            amount: 1_000,
            sender: sender.into(),
            receiver: "terp1tester".into(),
            timeout_timestamp_ns: 1,
        })]
    }

    fn fee(denom: &str) -> FeeSpec {
        FeeSpec {
            denom: denom.into(),
            amount: 5_000,
            gas_limit: 200_000,
            granter: None,
        }
    }

    fn single_mode(auth: &AuthInfo) -> i32 {
        match auth.signer_infos[0].mode_info.as_ref().unwrap().sum.as_ref().unwrap() {
            mode_info::Sum::Single(single) => single.mode,
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ethermint_signs_direct_with_family_type_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/auth/v1beta1/accounts/evmos1tester"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"account": {
                "@type": "/ethermint.types.v1.EthAccount",
                "base_account": {
                    "address": "evmos1tester",
                    "pub_key": null,
                    "account_number": "42",
                    "sequence": "3"
                },
                "code_hash": "0xc5d2"
            }})))
            .mount(&server)
            .await;

        let registry = Registry::mainnet();
        let evmos = registry.chain("Evmos").unwrap();
        let key = MockWallet::key_for(evmos);
        let wallet = MockWallet::default();
        let lcd = LcdClient::new(server.uri()).unwrap();
        let request = SignRequest {
            chain: evmos,
            key: &key,
            msgs: transfer(&key.address),
            fee: fee("aevmos"),
            memo: String::new(),
        };

        let raw = builder_for(&evmos.family)
            .sign(&request, &lcd, &wallet)
            .await
            .unwrap();

        assert_eq!(*wallet.last_is_ethereum.lock().unwrap(), Some(true));
        let tx = TxRaw::decode(raw.as_slice()).unwrap();
        assert_eq!(tx.signatures, vec![SIGNATURE.to_vec()]);
        let auth = AuthInfo::decode(tx.auth_info_bytes.as_slice()).unwrap();
        let signer = &auth.signer_infos[0];
        assert_eq!(signer.sequence, 3);
        assert_eq!(
            signer.public_key.as_ref().unwrap().type_url,
            ETHERMINT_PUBKEY_TYPE_URL
        );
        assert_eq!(single_mode(&auth), SignMode::Direct as i32);
    }

    #[tokio::test]
    async fn test_amino_signs_legacy_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/auth/v1beta1/accounts/osmo1tester"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "address": "osmo1tester",
                "account_number": "5",
                "sequence": "9"
            }})))
            .mount(&server)
            .await;

        let registry = Registry::mainnet();
        let osmosis = registry.chain("Osmosis").unwrap();
        let key = MockWallet::key_for(osmosis);
        let wallet = MockWallet::default();
        let lcd = LcdClient::new(server.uri()).unwrap();
        let request = SignRequest {
            chain: osmosis,
            key: &key,
            msgs: transfer(&key.address),
            fee: fee("uosmo"),
            memo: String::new(),
        };

        let raw = AminoTransferBuilder.sign(&request, &lcd, &wallet).await.unwrap();

        let doc = wallet.last_amino.lock().unwrap().clone().unwrap();
        assert_eq!(doc.chain_id, "osmosis-1");
        assert_eq!(doc.account_number, "5");
        assert_eq!(doc.msgs[0].kind, "cosmos-sdk/MsgTransfer");

        let tx = TxRaw::decode(raw.as_slice()).unwrap();
        let auth = AuthInfo::decode(tx.auth_info_bytes.as_slice()).unwrap();
        assert_eq!(auth.signer_infos[0].sequence, 9);
        assert_eq!(single_mode(&auth), SignMode::LegacyAminoJson as i32);
        assert_eq!(auth.fee.unwrap().amount[0].amount, "5000");
    }
}
