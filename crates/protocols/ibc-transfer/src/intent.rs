//! Transfer requests and their resolution against the registry

use chain_registry::{Chain, ChannelBinding, Registry, Token};
use ibc_tx::{normalize_amount, strip_separators};
use serde::{Deserialize, Serialize};
use terpdash_core::{RawAmount, TransferError, TransferMode};

/// What the user asked for: a direction, the counterparty chain, a token and
/// the amount as typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub mode: TransferMode,
    /// Counterparty chain name (or chain id)
    pub chain: String,
    pub token: String,
    pub amount: String,
}

/// A request resolved to concrete chains, route and base-unit amount
#[derive(Debug, Clone)]
pub struct TransferIntent {
    pub mode: TransferMode,
    pub source: Chain,
    pub destination: Chain,
    pub token: Token,
    pub binding: ChannelBinding,
    /// Channel on the source chain the packet leaves through
    pub channel: String,
    /// Amount as shown to the user (separators stripped)
    pub display_amount: String,
    pub raw_amount: RawAmount,
}

/// Resolve `request` against `registry`
///
/// Amount validation runs first so a bad amount never reaches the network or
/// the wallet.
pub fn resolve(registry: &Registry, request: &TransferRequest) -> Result<TransferIntent, TransferError> {
    let token = registry
        .token(&request.token)
        .ok_or_else(|| TransferError::UnknownToken {
            name: request.token.clone(),
        })?;

    let raw_amount = normalize_amount(&request.amount, token.decimals).map_err(|e| {
        tracing::warn!(amount = %request.amount, token = %token.name, error = %e, "Ignoring transfer with invalid amount");
        TransferError::InvalidAmount {
            message: e.to_string(),
        }
    })?;

    let counterparty = registry
        .chain(&request.chain)
        .ok_or_else(|| TransferError::UnknownChain {
            name: request.chain.clone(),
        })?;
    let home = registry
        .home_chain()
        .ok_or_else(|| TransferError::UnknownChain {
            name: chain_registry::constants::HOME_CHAIN_NAME.to_string(),
        })?;

    let unsupported = || TransferError::UnsupportedRoute {
        token: token.name.clone(),
        chain: counterparty.chain_name.clone(),
    };
    let (source, destination, binding, channel) = match request.mode {
        TransferMode::Deposit => (
            counterparty,
            home,
            token.deposit_binding(&counterparty.chain_name).ok_or_else(unsupported)?,
            registry
                .deposit_channel(&token.name, &counterparty.chain_name)
                .ok_or_else(unsupported)?,
        ),
        TransferMode::Withdrawal => (
            home,
            counterparty,
            token.withdrawal_binding(&counterparty.chain_name).ok_or_else(unsupported)?,
            registry
                .withdrawal_channel(&token.name, &counterparty.chain_name)
                .ok_or_else(unsupported)?,
        ),
    };

    Ok(TransferIntent {
        mode: request.mode,
        source: source.clone(),
        destination: destination.clone(),
        token: token.clone(),
        binding: binding.clone(),
        channel,
        display_amount: strip_separators(&request.amount),
        raw_amount,
    })
}

impl TransferIntent {
    /// The chain that is not the home chain
    pub fn counterparty(&self) -> &Chain {
        match self.mode {
            TransferMode::Deposit => &self.source,
            TransferMode::Withdrawal => &self.destination,
        }
    }

    /// Gas limit for this route: the binding override, else the chain default
    pub fn gas(&self) -> u64 {
        self.binding.gas.unwrap_or(match self.mode {
            TransferMode::Deposit => self.source.deposit_gas,
            TransferMode::Withdrawal => self.destination.withdraw_gas,
        })
    }

    pub fn sending_message(&self) -> String {
        format!(
            "Sending {} {} from {} to {}",
            self.display_amount, self.token.name, self.source.chain_name, self.destination.chain_name
        )
    }

    pub fn receiving_message(&self) -> String {
        format!(
            "Receiving {} {} on {} from {}",
            self.display_amount, self.token.name, self.destination.chain_name, self.source.chain_name
        )
    }

    pub fn received_message(&self) -> String {
        format!(
            "Received {} {} on {} from {}",
            self.display_amount, self.token.name, self.destination.chain_name, self.source.chain_name
        )
    }

    pub fn timeout_message(&self) -> String {
        format!(
            "Timed out while waiting to receive {} {} on {} from {}",
            self.display_amount, self.token.name, self.destination.chain_name, self.source.chain_name
        )
    }

    pub fn failure_message(&self, reason: &str) -> String {
        format!(
            "Failed sending {} {} from {} to {}: {}",
            self.display_amount,
            self.token.name,
            self.source.chain_name,
            self.destination.chain_name,
            reason
        )
    }
}
