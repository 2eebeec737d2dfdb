//! Transfer orchestrator
//!
//! `submit` validates and resolves a request, then runs the transfer on a
//! spawned task: connect the counterparty key if needed, build the message,
//! sign for the source chain's family, broadcast, follow the packet. Progress
//! is published on a per-submission `watch` channel carrying one notice.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chain_registry::constants::{
    ICS20_GATEWAY_ADDRESS, ICS20_GATEWAY_CODE_HASH, ICS20_GATEWAY_TIMEOUT_SECS,
};
use chain_registry::{Chain, Registry};
use ibc_tx::{timeout_timestamp_ns, BridgeMsg, ExecuteContract, FeeSpec, IbcTransfer, Ics20Gateway};
use lcd_client::LcdPool;
use serde::Serialize;
use terpdash_core::constants::WITHDRAW_GAS_PRICE;
use terpdash_core::{Address, AppConfig, TransferError, TransferMode, WalletError};
use tokio::sync::{watch, Mutex, RwLock};
use wallet_bridge::{WalletKey, WalletSession, WalletSigner};

use crate::ack::{AckOutcome, AckTracker};
use crate::balance::BalancePoller;
use crate::builder::{builder_for, SignRequest};
use crate::intent::{resolve, TransferIntent, TransferRequest};
use crate::notice::{NoticeLevel, TransferNotice};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub ack_interval: Duration,
    pub ack_timeout: Duration,
    /// Permit more than one transfer in flight
    pub allow_concurrent: bool,
    /// Granter put on withdrawal fees once the faucet granted an allowance
    pub faucet_address: String,
    pub gateway: Ics20Gateway,
    /// How long a finished transfer stays queryable through `notice`
    pub notice_retention: Duration,
}

/// Finished transfers are forgotten after this long
pub const NOTICE_RETENTION: Duration = Duration::from_secs(600);

impl OrchestratorConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            ack_interval: config.poll.ack_interval(),
            ack_timeout: config.poll.ack_timeout(),
            allow_concurrent: config.allow_concurrent_transfers,
            faucet_address: config.faucet.address.clone(),
            ..Default::default()
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let config = AppConfig::default();
        Self {
            ack_interval: config.poll.ack_interval(),
            ack_timeout: config.poll.ack_timeout(),
            allow_concurrent: false,
            faucet_address: config.faucet.address,
            gateway: Ics20Gateway {
                address: ICS20_GATEWAY_ADDRESS.to_string(),
                code_hash: ICS20_GATEWAY_CODE_HASH.to_string(),
            },
            notice_retention: NOTICE_RETENTION,
        }
    }
}

/// Offer to wrap freshly deposited tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapPrompt {
    pub transfer_id: String,
    pub token: String,
    pub amount: String,
}

/// Caller's view of one submission
#[derive(Debug, Clone)]
pub struct TransferHandle {
    pub id: String,
    notices: watch::Receiver<TransferNotice>,
}

impl TransferHandle {
    pub fn notice(&self) -> TransferNotice {
        self.notices.borrow().clone()
    }

    /// Wait for the final notice
    pub async fn finished(mut self) -> TransferNotice {
        let waited = self.notices.wait_for(|n| n.done).await.map(|n| n.clone());
        match waited {
            Ok(notice) => notice,
            // Task gone without a final update: report what was last seen.
            Err(_) => self.notices.borrow().clone(),
        }
    }
}

pub struct TransferOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<Registry>,
    lcd: LcdPool,
    wallet: Arc<dyn WalletSigner>,
    session: Arc<RwLock<WalletSession>>,
    balances: Option<Arc<BalancePoller>>,
    config: OrchestratorConfig,
    transfers: RwLock<HashMap<String, watch::Receiver<TransferNotice>>>,
    in_flight: AtomicUsize,
    wrap_prompts: Mutex<VecDeque<WrapPrompt>>,
}

/// Releases the in-flight slot when the transfer task ends, however it ends
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TransferOrchestrator {
    pub fn new(
        registry: Arc<Registry>,
        lcd: LcdPool,
        wallet: Arc<dyn WalletSigner>,
        session: Arc<RwLock<WalletSession>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                lcd,
                wallet,
                session,
                balances: None,
                config,
                transfers: RwLock::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                wrap_prompts: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Refresh `poller` whenever a transfer completes
    ///
    /// Must be called before the first `submit`.
    pub fn with_balance_poller(mut self, poller: Arc<BalancePoller>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.balances = Some(poller);
        }
        self
    }

    /// Start a transfer
    ///
    /// Invalid amounts, unknown routes and a missing wallet are rejected here,
    /// before anything is signed or sent.
    pub async fn submit(&self, request: TransferRequest) -> Result<TransferHandle, TransferError> {
        let inner = &self.inner;
        let intent = resolve(&inner.registry, &request)?;

        if !inner.session.read().await.is_connected() {
            let home = inner.registry.home_chain().map(|c| c.chain_name.clone());
            return Err(TransferError::NotConnected {
                chain: home.unwrap_or_default(),
            });
        }

        if inner.config.allow_concurrent {
            inner.in_flight.fetch_add(1, Ordering::SeqCst);
        } else if inner
            .in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(token = %intent.token.name, "Transfer rejected, another one is in flight");
            return Err(TransferError::AlreadyInFlight);
        }
        let guard = InFlightGuard(inner.clone());

        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = watch::channel(TransferNotice::loading(&id, intent.sending_message()));
        inner.transfers.write().await.insert(id.clone(), rx.clone());

        tracing::info!(
            id = %id,
            mode = %intent.mode,
            token = %intent.token.name,
            source = %intent.source.chain_name,
            destination = %intent.destination.chain_name,
            amount = %intent.raw_amount,
            "Transfer submitted"
        );

        let task_inner = inner.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            let final_notice = task_inner.run(&intent, &tx).await;
            drop(guard);
            tx.send_replace(final_notice);
            if let Some(balances) = &task_inner.balances {
                balances.refresh().await;
            }

            tokio::time::sleep(task_inner.config.notice_retention).await;
            task_inner.transfers.write().await.remove(&task_id);
            tracing::debug!(id = %task_id, "Finished transfer forgotten");
        });

        Ok(TransferHandle { id, notices: rx })
    }

    /// Latest notice of a submission; `None` once a finished transfer aged out
    pub async fn notice(&self, id: &str) -> Option<TransferNotice> {
        self.inner
            .transfers
            .read()
            .await
            .get(id)
            .map(|rx| rx.borrow().clone())
    }

    /// Pop the oldest pending wrap prompt
    pub async fn take_wrap_prompt(&self) -> Option<WrapPrompt> {
        self.inner.wrap_prompts.lock().await.pop_front()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }
}

impl Inner {
    /// Drive one transfer to its final notice
    async fn run(&self, intent: &TransferIntent, tx: &watch::Sender<TransferNotice>) -> TransferNotice {
        match self.execute(intent, tx).await {
            Ok(notice) => notice,
            Err(e) => {
                let reason = match &e {
                    TransferError::BroadcastFailed { raw_log, .. } => raw_log.clone(),
                    other => other.to_string(),
                };
                tracing::warn!(error = %e, "Transfer failed");
                let current = tx.borrow().clone();
                current.finish(NoticeLevel::Error, intent.failure_message(&reason))
            }
        }
    }

    async fn execute(
        &self,
        intent: &TransferIntent,
        tx: &watch::Sender<TransferNotice>,
    ) -> Result<TransferNotice, TransferError> {
        let (sender, receiver) = self.keys_for(intent).await?;
        let msg = message_for(intent, &sender.address, &receiver, &self.config.gateway, SystemTime::now());
        let fee = self.fee_for(intent).await;

        let lcd = self.lcd.client(&intent.source.lcd);
        let request = SignRequest {
            chain: &intent.source,
            key: &sender,
            msgs: vec![msg],
            fee,
            memo: String::new(),
        };
        let tx_bytes = builder_for(&intent.source.family)
            .sign(&request, &lcd, self.wallet.as_ref())
            .await?;

        let broadcast = lcd.broadcast_tx(&tx_bytes).await?;
        if !broadcast.is_success() {
            return Err(TransferError::BroadcastFailed {
                code: broadcast.code,
                raw_log: broadcast.raw_log,
            });
        }
        tracing::info!(txhash = %broadcast.txhash, chain = %intent.source.chain_name, "Transfer broadcast");
        let current = tx.borrow().clone();
        tx.send_replace(current.broadcast(intent.receiving_message(), broadcast.txhash.clone()));

        let outcome = AckTracker::new(self.config.ack_interval, self.config.ack_timeout)
            .track(&lcd, &broadcast.txhash)
            .await?;

        let current = tx.borrow().clone();
        Ok(match outcome {
            AckOutcome::Ack => {
                tracing::info!(txhash = %broadcast.txhash, "Transfer acknowledged");
                if intent.mode == TransferMode::Deposit {
                    self.wrap_prompts.lock().await.push_back(WrapPrompt {
                        transfer_id: current.id.clone(),
                        token: intent.token.name.clone(),
                        amount: intent.display_amount.clone(),
                    });
                }
                current.finish(NoticeLevel::Success, intent.received_message())
            }
            AckOutcome::Timeout | AckOutcome::Expired => {
                tracing::warn!(txhash = %broadcast.txhash, outcome = ?outcome, "Transfer not acknowledged");
                current.finish(NoticeLevel::Warning, intent.timeout_message())
            }
        })
    }

    /// Signing key on the source chain and receiver address on the destination
    async fn keys_for(&self, intent: &TransferIntent) -> Result<(WalletKey, String), TransferError> {
        let home_key = self.session.read().await.home_key().cloned().ok_or_else(|| {
            TransferError::NotConnected {
                chain: self.home_name(),
            }
        })?;
        let remote_key = self.remote_key(intent.counterparty()).await?;

        Ok(match intent.mode {
            TransferMode::Deposit => (remote_key, home_key.address),
            TransferMode::Withdrawal => (home_key, remote_key.address),
        })
    }

    /// Session key for `chain`, asking the wallet (suggest, then enable) when absent
    async fn remote_key(&self, chain: &Chain) -> Result<WalletKey, TransferError> {
        if let Some(key) = self.session.read().await.key(&chain.chain_id).cloned() {
            return Ok(key);
        }

        tracing::info!(chain = %chain.chain_name, "Connecting wallet on demand");
        let key = self.wallet.connect(chain).await?;
        if !chain.owns_address(&Address::new(key.address.as_str())) {
            return Err(WalletError::Rejected {
                reason: format!("address {} is not a {} address", key.address, chain.chain_name),
            }
            .into());
        }
        self.session.write().await.set_key(key.clone());
        Ok(key)
    }

    async fn fee_for(&self, intent: &TransferIntent) -> FeeSpec {
        let gas = intent.gas();
        match intent.mode {
            TransferMode::Deposit => FeeSpec {
                denom: intent.source.gas_denom.clone(),
                amount: intent.source.fee_for_gas(gas),
                gas_limit: gas,
                granter: None,
            },
            TransferMode::Withdrawal => FeeSpec {
                denom: intent.source.gas_denom.clone(),
                amount: (gas as f64 * WITHDRAW_GAS_PRICE).ceil() as u128,
                gas_limit: gas,
                granter: self
                    .session
                    .read()
                    .await
                    .fee_granter(&self.config.faucet_address),
            },
        }
    }

    fn home_name(&self) -> String {
        self.registry
            .home_chain()
            .map(|c| c.chain_name.clone())
            .unwrap_or_default()
    }
}

/// Message moving `intent` from `sender` to `receiver`
///
/// Contract tokens leave the home chain through the ICS-20 gateway; everything
/// else is a plain `MsgTransfer`.
fn message_for(
    intent: &TransferIntent,
    sender: &str,
    receiver: &str,
    gateway: &Ics20Gateway,
    now: SystemTime,
) -> BridgeMsg {
    match (intent.mode, intent.token.contract()) {
        (TransferMode::Withdrawal, Some(contract)) => BridgeMsg::Execute(ExecuteContract::gateway_send(
            sender,
            &contract.address,
            gateway,
            intent.raw_amount,
            &intent.channel,
            receiver,
            ICS20_GATEWAY_TIMEOUT_SECS,
        )),
        _ => BridgeMsg::Transfer(IbcTransfer {
            source_channel: intent.channel.clone(),
            denom: intent.binding.from_denom.clone(),
            amount: intent.raw_amount,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            timeout_timestamp_ns: timeout_timestamp_ns(now),
        }),
    }
}
