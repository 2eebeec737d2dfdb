//! IBC bridge transfers
//!
//! Moves tokens between Terp Network and its counterparty chains: resolving a
//! request against the registry, building and signing the transaction for the
//! source chain's signing family, broadcasting it and following the packet
//! until it is acknowledged or times out. The balance poller keeps the
//! spendable amount of the current selection fresh.

pub mod ack;
pub mod balance;
pub mod builder;
pub mod intent;
pub mod notice;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use ack::{AckOutcome, AckTracker, PacketRef};
pub use balance::{BalancePoller, BalanceSelection, BalanceSnapshot, BalanceState};
pub use builder::{
    builder_for, AminoTransferBuilder, EthermintTransferBuilder, SignRequest, TransferBuilder,
};
pub use intent::{resolve, TransferIntent, TransferRequest};
pub use notice::{NoticeLevel, TransferNotice, TransferResult, TransferStatus};
pub use orchestrator::{
    OrchestratorConfig, TransferHandle, TransferOrchestrator, WrapPrompt, NOTICE_RETENTION,
};
