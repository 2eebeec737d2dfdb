//! Application state shared across API handlers

use std::sync::Arc;

use chain_registry::{Chain, Registry};
use dashboard::{spawn_loader, AppDirectory, MarketClient, MetricsAggregator, APPS_RETRY_INTERVAL};
use ibc_transfer::{BalancePoller, OrchestratorConfig, TransferOrchestrator};
use lcd_client::{LcdClient, LcdPool};
use terpdash_core::{AppConfig, LcdError};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use wallet_bridge::{BridgeSigner, WalletBridgeServer, WalletSession, WalletSigner};

/// Errors that can occur while building the application state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Home chain missing from registry")]
    NoHomeChain,

    #[error("LCD setup failed: {0}")]
    Lcd(#[from] LcdError),

    /// Wallet bridge page server failed to bind
    #[error("Wallet bridge server error: {0}")]
    WalletBridge(#[from] std::io::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    registry: Arc<Registry>,
    home: Chain,
    lcd: LcdPool,
    signer: BridgeSigner,
    session: Arc<RwLock<WalletSession>>,
    balances: Arc<BalancePoller>,
    transfers: TransferOrchestrator,
    metrics: MetricsAggregator,
    apps: Arc<RwLock<Option<AppDirectory>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AppState {
    /// Build every service and start the wallet bridge page server
    ///
    /// Background loading is separate, see [`AppState::start_background`].
    pub async fn new(config: AppConfig) -> Result<Self, StateError> {
        let mut registry = Registry::mainnet();
        if let Some(url) = &config.home_lcd_url {
            registry = registry.with_home_lcd(url.clone());
        }
        let registry = Arc::new(registry);
        let home = registry.home_chain().cloned().ok_or(StateError::NoHomeChain)?;

        let lcd = LcdPool::new()?;
        let bridge = WalletBridgeServer::start_on_port(config.wallet_bridge_port).await?;
        tracing::info!(port = bridge.port(), "Wallet bridge listening");
        let signer = BridgeSigner::new(Arc::new(bridge));

        let session = Arc::new(RwLock::new(WalletSession::new(home.chain_id.clone())));
        let balances = Arc::new(BalancePoller::new(
            registry.clone(),
            lcd.clone(),
            session.clone(),
            config.poll.balance_interval(),
        ));
        let wallet: Arc<dyn WalletSigner> = Arc::new(signer.clone());
        let transfers = TransferOrchestrator::new(
            registry.clone(),
            lcd.clone(),
            wallet,
            session.clone(),
            OrchestratorConfig::from_app_config(&config),
        )
        .with_balance_poller(balances.clone());

        let metrics = MetricsAggregator::new(
            MarketClient::new(lcd.http().clone(), config.market.clone()),
            lcd.client(&home.lcd),
            home.stake_currency.coin_minimal_denom.clone(),
            home.stake_currency.coin_decimals,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                registry,
                home,
                lcd,
                signer,
                session,
                balances,
                transfers,
                metrics,
                apps: Arc::new(RwLock::new(None)),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Start the app-directory loader and the first dashboard refresh
    pub async fn start_background(&self) {
        let loader = spawn_loader(
            MarketClient::new(self.inner.lcd.http().clone(), self.inner.config.market.clone()),
            self.inner.apps.clone(),
            APPS_RETRY_INTERVAL,
        );

        let state = self.clone();
        let refresh = tokio::spawn(async move {
            state.metrics().refresh().await;
        });

        self.inner.tasks.lock().await.extend([loader, refresh]);
    }

    /// Stop background work: loaders, balance polling
    pub async fn shutdown(&self) {
        for task in self.inner.tasks.lock().await.drain(..) {
            task.abort();
        }
        self.inner.balances.stop().await;
        tracing::info!("Application state shut down");
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn home_chain(&self) -> &Chain {
        &self.inner.home
    }

    pub fn lcd(&self) -> &LcdPool {
        &self.inner.lcd
    }

    pub fn home_lcd(&self) -> LcdClient {
        self.inner.lcd.client(&self.inner.home.lcd)
    }

    pub fn signer(&self) -> &BridgeSigner {
        &self.inner.signer
    }

    pub fn session(&self) -> &Arc<RwLock<WalletSession>> {
        &self.inner.session
    }

    pub fn balances(&self) -> &BalancePoller {
        &self.inner.balances
    }

    pub fn transfers(&self) -> &TransferOrchestrator {
        &self.inner.transfers
    }

    pub fn metrics(&self) -> &MetricsAggregator {
        &self.inner.metrics
    }

    pub async fn apps(&self) -> Option<AppDirectory> {
        self.inner.apps.read().await.clone()
    }

    #[cfg(test)]
    pub(crate) async fn set_apps(&self, directory: AppDirectory) {
        *self.inner.apps.write().await = Some(directory);
    }
}
