//! Bridge messages in their protobuf and amino JSON forms

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin as ProtoCoin;
use cosmos_sdk_proto::cosmwasm::wasm::v1::MsgExecuteContract;
use cosmos_sdk_proto::ibc::applications::transfer::v1::MsgTransfer;
use prost::Message;
use prost_types::Any;
use serde_json::json;
use terpdash_core::constants::TRANSFER_PORT;
use terpdash_core::RawAmount;

use crate::sign_doc::AminoMsg;

pub const MSG_TRANSFER_TYPE_URL: &str = "/ibc.applications.transfer.v1.MsgTransfer";
pub const MSG_EXECUTE_CONTRACT_TYPE_URL: &str = "/cosmwasm.wasm.v1.MsgExecuteContract";

const MSG_TRANSFER_AMINO_TYPE: &str = "cosmos-sdk/MsgTransfer";
const MSG_EXECUTE_CONTRACT_AMINO_TYPE: &str = "wasm/MsgExecuteContract";

/// ICS-20 transfer out of `source_channel`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbcTransfer {
    pub source_channel: String,
    pub denom: String,
    pub amount: RawAmount,
    pub sender: String,
    pub receiver: String,
    /// Absolute timeout, nanoseconds since the Unix epoch
    pub timeout_timestamp_ns: u64,
}

/// Contract call carrying a JSON message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteContract {
    pub sender: String,
    pub contract: String,
    pub msg: serde_json::Value,
}

/// Gateway contract that relays contract tokens over ICS-20
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ics20Gateway {
    pub address: String,
    pub code_hash: String,
}

/// Any message the bridge signs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeMsg {
    Transfer(IbcTransfer),
    Execute(ExecuteContract),
}

impl IbcTransfer {
    pub fn to_proto(&self) -> MsgTransfer {
        MsgTransfer {
            source_port: TRANSFER_PORT.to_string(),
            source_channel: self.source_channel.clone(),
            token: Some(ProtoCoin {
                denom: self.denom.clone(),
                amount: self.amount.to_string(),
            }),
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            timeout_height: None,
            timeout_timestamp: self.timeout_timestamp_ns,
            ..Default::default()
        }
    }

    /// Amino form; zero-valued fields are omitted the way the SDK's codec does
    pub fn to_amino(&self) -> AminoMsg {
        AminoMsg {
            kind: MSG_TRANSFER_AMINO_TYPE.to_string(),
            value: json!({
                "source_port": TRANSFER_PORT,
                "source_channel": self.source_channel,
                "token": {"denom": self.denom, "amount": self.amount.to_string()},
                "sender": self.sender,
                "receiver": self.receiver,
                "timeout_height": {},
                "timeout_timestamp": self.timeout_timestamp_ns.to_string(),
            }),
        }
    }
}

impl ExecuteContract {
    /// Contract-token withdrawal: `send` the tokens to the ICS-20 gateway with
    /// a forwarding payload naming the channel and remote receiver
    pub fn gateway_send(
        sender: &str,
        token_contract: &str,
        gateway: &Ics20Gateway,
        amount: RawAmount,
        channel: &str,
        remote_address: &str,
        timeout_secs: u64,
    ) -> Self {
        let forward = json!({
            "channel": channel,
            "remote_address": remote_address,
            "timeout": timeout_secs,
        });
        Self {
            sender: sender.to_string(),
            contract: token_contract.to_string(),
            msg: json!({
                "send": {
                    "recipient": gateway.address,
                    "recipient_code_hash": gateway.code_hash,
                    "amount": amount.to_string(),
                    "msg": BASE64.encode(forward.to_string()),
                }
            }),
        }
    }

    pub fn to_proto(&self) -> MsgExecuteContract {
        MsgExecuteContract {
            sender: self.sender.clone(),
            contract: self.contract.clone(),
            msg: self.msg.to_string().into_bytes(),
            funds: vec![],
        }
    }

    pub fn to_amino(&self) -> AminoMsg {
        AminoMsg {
            kind: MSG_EXECUTE_CONTRACT_AMINO_TYPE.to_string(),
            value: json!({
                "sender": self.sender,
                "contract": self.contract,
                "msg": self.msg,
                "funds": [],
            }),
        }
    }
}

impl BridgeMsg {
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Transfer(_) => MSG_TRANSFER_TYPE_URL,
            Self::Execute(_) => MSG_EXECUTE_CONTRACT_TYPE_URL,
        }
    }

    pub fn to_any(&self) -> Any {
        let value = match self {
            Self::Transfer(m) => m.to_proto().encode_to_vec(),
            Self::Execute(m) => m.to_proto().encode_to_vec(),
        };
        Any {
            type_url: self.type_url().to_string(),
            value,
        }
    }

    pub fn to_amino(&self) -> AminoMsg {
        match self {
            Self::Transfer(m) => m.to_amino(),
            Self::Execute(m) => m.to_amino(),
        }
    }

    /// Address expected to sign this message
    pub fn signer(&self) -> &str {
        match self {
            Self::Transfer(m) => &m.sender,
            Self::Execute(m) => &m.sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer() -> IbcTransfer {
        IbcTransfer {
            source_channel: "channel-8691".into(),
            denom: "uosmo".into(),
            amount: 1_500_000,
            sender: "osmo1sender".into(),
            receiver: "terp1receiver".into(),
            timeout_timestamp_ns: 1_700_000_600_000_000_000,
        }
    }

    #[test]
    fn test_transfer_any_decodes() {
        let any = BridgeMsg::Transfer(transfer()).to_any();
        assert_eq!(any.type_url, MSG_TRANSFER_TYPE_URL);
        let decoded = MsgTransfer::decode(any.value.as_slice()).unwrap();
        assert_eq!(decoded.source_port, "transfer");
        assert_eq!(decoded.source_channel, "channel-8691");
        assert_eq!(decoded.token.unwrap().amount, "1500000");
        assert_eq!(decoded.timeout_timestamp, 1_700_000_600_000_000_000);
        assert!(decoded.timeout_height.is_none());
    }

    #[test]
    fn test_transfer_amino_shape() {
        let amino = transfer().to_amino();
        assert_eq!(amino.kind, "cosmos-sdk/MsgTransfer");
        assert_eq!(amino.value["timeout_timestamp"], "1700000600000000000");
        assert_eq!(amino.value["token"]["denom"], "uosmo");
        assert!(amino.value["timeout_height"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_gateway_send_payload() {
        let gateway = Ics20Gateway {
            address: "terp1gateway".into(),
            code_hash: "abc123".into(),
        };
        let msg = ExecuteContract::gateway_send(
            "terp1sender",
            "terp1token",
            &gateway,
            42,
            "channel-1",
            "cosmos1remote",
            600,
        );
        assert_eq!(msg.contract, "terp1token");
        assert_eq!(msg.msg["send"]["recipient"], "terp1gateway");
        assert_eq!(msg.msg["send"]["amount"], "42");

        let encoded = msg.msg["send"]["msg"].as_str().unwrap();
        let forward: serde_json::Value =
            serde_json::from_slice(&BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(forward["channel"], "channel-1");
        assert_eq!(forward["remote_address"], "cosmos1remote");
        assert_eq!(forward["timeout"], 600);

        let proto = msg.to_proto();
        let inner: serde_json::Value = serde_json::from_slice(&proto.msg).unwrap();
        assert_eq!(inner, msg.msg);
        assert!(proto.funds.is_empty());
    }
}
