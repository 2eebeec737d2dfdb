//! Balance poller
//!
//! Keeps the spendable balance of the current (direction, chain, token,
//! address) selection fresh. Exactly one poll task runs at a time: selecting
//! aborts the previous task before spawning the next one, and every published
//! state is tagged with the selection generation so a task that was aborted
//! mid-fetch can never overwrite a newer selection.

use std::sync::Arc;
use std::time::Duration;

use chain_registry::Registry;
use lcd_client::LcdPool;
use serde::{Deserialize, Serialize};
use serde_json::json;
use terpdash_core::{RawAmount, TransferMode};
use tokio::sync::{watch, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use wallet_bridge::WalletSession;

/// What the balance is shown for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSelection {
    pub mode: TransferMode,
    /// Counterparty chain name
    pub chain: String,
    pub token: String,
    /// Address on the sending chain
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceState {
    Loading,
    Amount(RawAmount),
    /// Contract token without a usable viewing key
    NeedsViewingKey,
    Error(String),
}

/// Latest published balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    generation: u64,
    pub selection: Option<BalanceSelection>,
    pub state: BalanceState,
}

struct PollTask {
    handle: JoinHandle<()>,
    refresh: Arc<Notify>,
}

/// Registry, LCD access and session shared with the poll task
#[derive(Clone)]
struct FetchContext {
    registry: Arc<Registry>,
    lcd: LcdPool,
    session: Arc<RwLock<WalletSession>>,
}

pub struct BalancePoller {
    ctx: FetchContext,
    interval: Duration,
    state: Arc<watch::Sender<BalanceSnapshot>>,
    task: Mutex<Option<PollTask>>,
}

impl BalancePoller {
    pub fn new(
        registry: Arc<Registry>,
        lcd: LcdPool,
        session: Arc<RwLock<WalletSession>>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(BalanceSnapshot {
            generation: 0,
            selection: None,
            state: BalanceState::Loading,
        });
        Self {
            ctx: FetchContext {
                registry,
                lcd,
                session,
            },
            interval,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    /// Start polling `selection`, replacing any previous poll task
    pub async fn select(&self, selection: BalanceSelection) {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.handle.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|snap| {
            snap.generation += 1;
            generation = snap.generation;
            snap.selection = Some(selection.clone());
            snap.state = BalanceState::Loading;
        });

        tracing::debug!(
            mode = %selection.mode,
            chain = %selection.chain,
            token = %selection.token,
            "Balance selection changed"
        );

        let refresh = Arc::new(Notify::new());
        let handle = tokio::spawn(poll_loop(
            self.ctx.clone(),
            selection,
            generation,
            self.state.clone(),
            refresh.clone(),
            self.interval,
        ));
        *task = Some(PollTask { handle, refresh });
    }

    /// Fetch now instead of waiting for the next tick
    pub async fn refresh(&self) {
        if let Some(task) = self.task.lock().await.as_ref() {
            task.refresh.notify_one();
        }
    }

    /// Cancel polling; the last published state is kept
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.handle.abort();
        }
    }

    /// Cancel polling and forget the selection (wallet disconnected)
    pub async fn clear(&self) {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.handle.abort();
        }
        self.state.send_modify(|snap| {
            snap.generation += 1;
            snap.selection = None;
            snap.state = BalanceState::Loading;
        });
        tracing::debug!("Balance selection cleared");
    }

    pub fn snapshot(&self) -> BalanceSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceSnapshot> {
        self.state.subscribe()
    }
}

impl Drop for BalancePoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}

async fn poll_loop(
    ctx: FetchContext,
    selection: BalanceSelection,
    generation: u64,
    state: Arc<watch::Sender<BalanceSnapshot>>,
    refresh: Arc<Notify>,
    interval: Duration,
) {
    loop {
        let next = fetch_balance(&ctx, &selection).await;
        if let BalanceState::Error(message) = &next {
            tracing::warn!(chain = %selection.chain, token = %selection.token, %message, "Balance fetch failed");
        }
        state.send_if_modified(|snap| {
            if snap.generation != generation || snap.state == next {
                return false;
            }
            snap.state = next;
            true
        });

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = refresh.notified() => {}
        }
    }
}

async fn fetch_balance(ctx: &FetchContext, selection: &BalanceSelection) -> BalanceState {
    match try_fetch(ctx, selection).await {
        Ok(state) => state,
        Err(message) => BalanceState::Error(message),
    }
}

async fn try_fetch(ctx: &FetchContext, sel: &BalanceSelection) -> Result<BalanceState, String> {
    let token = ctx
        .registry
        .token(&sel.token)
        .ok_or_else(|| format!("unknown token {}", sel.token))?;
    let counterparty = ctx
        .registry
        .chain(&sel.chain)
        .ok_or_else(|| format!("unknown chain {}", sel.chain))?;
    let unsupported = || format!("{} cannot move via {}", token.name, counterparty.chain_name);

    match sel.mode {
        TransferMode::Deposit => {
            let binding = token
                .deposit_binding(&counterparty.chain_name)
                .ok_or_else(unsupported)?;
            let amount = ctx
                .lcd
                .client(&counterparty.lcd)
                .balance_of(&sel.address, &binding.from_denom)
                .await
                .map_err(|e| e.to_string())?;
            Ok(BalanceState::Amount(amount))
        }
        TransferMode::Withdrawal => {
            let binding = token
                .withdrawal_binding(&counterparty.chain_name)
                .ok_or_else(unsupported)?;
            let home = ctx
                .registry
                .home_chain()
                .ok_or_else(|| "home chain missing from registry".to_string())?;
            let lcd = ctx.lcd.client(&home.lcd);

            let Some(contract) = token.contract() else {
                let amount = lcd
                    .balance_of(&sel.address, &binding.from_denom)
                    .await
                    .map_err(|e| e.to_string())?;
                return Ok(BalanceState::Amount(amount));
            };

            let viewing_key = ctx
                .session
                .read()
                .await
                .viewing_key(&contract.address)
                .map(str::to_string);
            let Some(viewing_key) = viewing_key else {
                return Ok(BalanceState::NeedsViewingKey);
            };

            let query = json!({"balance": {"address": sel.address, "key": viewing_key}});
            let data = lcd
                .smart_query(&contract.address, &query)
                .await
                .map_err(|e| e.to_string())?;
            contract_balance(&data)
        }
    }
}

/// Interpret a contract `balance` query answer
fn contract_balance(data: &serde_json::Value) -> Result<BalanceState, String> {
    if data.get("viewing_key_error").is_some() {
        return Ok(BalanceState::NeedsViewingKey);
    }
    data.get("balance")
        .and_then(|b| b.get("amount"))
        .and_then(|a| a.as_str())
        .and_then(|a| a.parse::<RawAmount>().ok())
        .map(BalanceState::Amount)
        .ok_or_else(|| format!("unexpected balance answer: {}", data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(5);

    fn poller(registry: Registry, session: WalletSession, interval: Duration) -> BalancePoller {
        BalancePoller::new(
            Arc::new(registry),
            LcdPool::new().unwrap(),
            Arc::new(RwLock::new(session)),
            interval,
        )
    }

    fn selection(mode: TransferMode, chain: &str, token: &str, address: &str) -> BalanceSelection {
        BalanceSelection {
            mode,
            chain: chain.into(),
            token: token.into(),
            address: address.into(),
        }
    }

    async fn settled(poller: &BalancePoller) -> BalanceState {
        let mut rx = poller.subscribe();
        let snap = tokio::time::timeout(WAIT, rx.wait_for(|s| s.state != BalanceState::Loading))
            .await
            .unwrap()
            .unwrap()
            .clone();
        snap.state
    }

    async fn mount_balances(server: &MockServer, address: &str, denom: &str, amount: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/cosmos/bank/v1beta1/balances/{}", address)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "balances": [{"denom": denom, "amount": amount}]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_deposit_reads_source_chain_denom() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_chain_lcd("Osmosis", server.uri());
        let denom = registry.deposit_binding("TERP", "Osmosis").unwrap().from_denom.clone();
        mount_balances(&server, "osmo1tester", &denom, "1234").await;

        let poller = poller(registry, WalletSession::new("morocco-1"), Duration::from_secs(60));
        poller
            .select(selection(TransferMode::Deposit, "Osmosis", "TERP", "osmo1tester"))
            .await;
        assert_eq!(settled(&poller).await, BalanceState::Amount(1234));
    }

    #[tokio::test]
    async fn test_missing_denom_is_zero() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_chain_lcd("Osmosis", server.uri());
        mount_balances(&server, "osmo1tester", "uosmo", "99").await;

        let poller = poller(registry, WalletSession::new("morocco-1"), Duration::from_secs(60));
        poller
            .select(selection(TransferMode::Deposit, "Osmosis", "TERP", "osmo1tester"))
            .await;
        assert_eq!(settled(&poller).await, BalanceState::Amount(0));
    }

    #[tokio::test]
    async fn test_contract_token_without_viewing_key() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_home_lcd(server.uri());

        let poller = poller(registry, WalletSession::new("morocco-1"), Duration::from_secs(60));
        poller
            .select(selection(TransferMode::Withdrawal, "Cosmos Hub", "sATOM", "terp1tester"))
            .await;
        assert_eq!(settled(&poller).await, BalanceState::NeedsViewingKey);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contract_token_with_viewing_key() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_home_lcd(server.uri());
        let contract = registry.token("sATOM").unwrap().contract().unwrap().address.clone();
        Mock::given(method("GET"))
            .and(path_regex(format!("^/cosmwasm/wasm/v1/contract/{}/smart/.+$", contract)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"balance": {"amount": "5000000"}}
            })))
            .mount(&server)
            .await;

        let mut session = WalletSession::new("morocco-1");
        session.set_viewing_key(contract, "api_key_abc");
        let poller = poller(registry, session, Duration::from_secs(60));
        poller
            .select(selection(TransferMode::Withdrawal, "Cosmos Hub", "sATOM", "terp1tester"))
            .await;
        assert_eq!(settled(&poller).await, BalanceState::Amount(5_000_000));
    }

    #[test]
    fn test_viewing_key_error_answer() {
        let answer = json!({"viewing_key_error": {"msg": "Wrong viewing key for this address or viewing key not set"}});
        assert_eq!(contract_balance(&answer), Ok(BalanceState::NeedsViewingKey));
        assert!(contract_balance(&json!({"other": 1})).is_err());
    }

    #[tokio::test]
    async fn test_failed_fetch_publishes_error() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_home_lcd(server.uri());
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let poller = poller(registry, WalletSession::new("morocco-1"), Duration::from_secs(60));
        poller
            .select(selection(TransferMode::Withdrawal, "Osmosis", "TERP", "terp1tester"))
            .await;
        assert!(matches!(settled(&poller).await, BalanceState::Error(_)));
    }

    #[tokio::test]
    async fn test_reselect_leaves_one_task() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_chain_lcd("Osmosis", server.uri());
        mount_balances(&server, "osmo1first", "uosmo", "1").await;
        mount_balances(&server, "osmo1second", "uosmo", "2").await;

        let poller = poller(registry, WalletSession::new("morocco-1"), Duration::from_millis(20));
        poller
            .select(selection(TransferMode::Deposit, "Osmosis", "TERP", "osmo1first"))
            .await;
        poller
            .select(selection(TransferMode::Deposit, "Osmosis", "TERP", "osmo1second"))
            .await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        poller.stop().await;

        let requests = server.received_requests().await.unwrap();
        let hits = |addr: &str| requests.iter().filter(|r| r.url.path().ends_with(addr)).count();
        assert!(hits("osmo1first") <= 1);
        assert!(hits("osmo1second") >= 3);
        assert_eq!(
            poller.snapshot().selection.unwrap().address,
            "osmo1second"
        );
    }

    #[tokio::test]
    async fn test_refresh_fetches_immediately() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_home_lcd(server.uri());
        Mock::given(method("GET"))
            .and(path("/cosmos/bank/v1beta1/balances/terp1tester"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "balances": [{"denom": "uterp", "amount": "100"}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_balances(&server, "terp1tester", "uterp", "250").await;

        let poller = poller(registry, WalletSession::new("morocco-1"), Duration::from_secs(3600));
        poller
            .select(selection(TransferMode::Withdrawal, "Osmosis", "TERP", "terp1tester"))
            .await;
        assert_eq!(settled(&poller).await, BalanceState::Amount(100));

        poller.refresh().await;
        let mut rx = poller.subscribe();
        let snap = tokio::time::timeout(WAIT, rx.wait_for(|s| s.state == BalanceState::Amount(250)))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert_eq!(snap.state, BalanceState::Amount(250));
    }

    #[tokio::test]
    async fn test_clear_forgets_selection() {
        let server = MockServer::start().await;
        let registry = Registry::mainnet().with_chain_lcd("Osmosis", server.uri());
        mount_balances(&server, "osmo1tester", "uosmo", "5").await;

        let poller = poller(registry, WalletSession::new("morocco-1"), Duration::from_millis(20));
        poller
            .select(selection(TransferMode::Deposit, "Osmosis", "TERP", "osmo1tester"))
            .await;
        assert_eq!(settled(&poller).await, BalanceState::Amount(0));

        poller.clear().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let seen = server.received_requests().await.unwrap().len();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snap = poller.snapshot();
        assert!(snap.selection.is_none());
        assert_eq!(snap.state, BalanceState::Loading);
        assert_eq!(server.received_requests().await.unwrap().len(), seen);
    }
}
