//! ibc-tx: transaction building for IBC bridge transfers
//!
//! Amount normalization, the two bridge message kinds (`MsgTransfer` and the
//! contract-token gateway `send`), amino and direct sign documents, and
//! `TxRaw` assembly. Protobuf encoding comes from `cosmos-sdk-proto`.

pub mod amount;
pub mod msgs;
pub mod sign_doc;
pub mod timeout;
pub mod tx_raw;

pub use amount::{
    amount_for_percentage, format_amount, normalize_amount, strip_separators, AmountError,
};
pub use msgs::{BridgeMsg, ExecuteContract, IbcTransfer, Ics20Gateway};
pub use sign_doc::{AminoCoin, AminoMsg, DirectSignDoc, StdFee, StdSignDoc};
pub use timeout::timeout_timestamp_ns;
pub use tx_raw::{
    amino_tx_raw, assemble, decode_base64, encode_auth_info, encode_body, pubkey_any, FeeSpec,
    SECP256K1_PUBKEY_TYPE_URL,
};

pub use cosmos_sdk_proto::cosmos::tx::signing::v1beta1::SignMode;
