//! Read-only lookup over the chain and token tables

use crate::chains::Chain;
use crate::constants::{self, DEFAULT_SOURCE_CHAIN, HOME_CHAIN_NAME};
use crate::tokens::{ChannelBinding, Token};

/// Chains and tokens known to the bridge
#[derive(Debug, Clone)]
pub struct Registry {
    chains: Vec<Chain>,
    tokens: Vec<Token>,
}

impl Registry {
    /// Build a registry from explicit tables
    ///
    /// The home chain must be present; lookups that need it return `None`
    /// otherwise.
    pub fn new(chains: Vec<Chain>, tokens: Vec<Token>) -> Self {
        Self { chains, tokens }
    }

    /// Registry backed by the built-in mainnet tables
    pub fn mainnet() -> Self {
        Self::new(constants::chains(), constants::tokens())
    }

    /// Point the home chain at a different LCD endpoint
    pub fn with_home_lcd(mut self, lcd: impl Into<String>) -> Self {
        let lcd = lcd.into();
        if let Some(home) = self
            .chains
            .iter_mut()
            .find(|c| c.chain_name == HOME_CHAIN_NAME)
        {
            home.lcd = lcd;
        }
        self
    }

    /// Point any chain at a different LCD endpoint
    pub fn with_chain_lcd(mut self, chain_name: &str, lcd: impl Into<String>) -> Self {
        let lcd = lcd.into();
        if let Some(chain) = self
            .chains
            .iter_mut()
            .find(|c| c.chain_name.eq_ignore_ascii_case(chain_name))
        {
            chain.lcd = lcd;
        }
        self
    }

    /// Chain by display name (case-insensitive) or chain id
    pub fn chain(&self, name: &str) -> Option<&Chain> {
        self.chains
            .iter()
            .find(|c| c.chain_name.eq_ignore_ascii_case(name) || c.chain_id == name)
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Counterparty chains, i.e. everything except the home chain
    pub fn remote_chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains
            .iter()
            .filter(|c| c.chain_name != HOME_CHAIN_NAME)
    }

    pub fn home_chain(&self) -> Option<&Chain> {
        self.chain(HOME_CHAIN_NAME)
    }

    /// Token by name (case-sensitive; `ATOM` and `sATOM` are different tokens)
    pub fn token(&self, name: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.name == name)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Tokens that can be deposited from `source_chain`, native tokens first
    pub fn supported_tokens(&self, source_chain: &str) -> Vec<&Token> {
        let routable = |t: &&Token| t.deposit_binding(source_chain).is_some();
        let native = self.tokens.iter().filter(|t| !t.is_contract()).filter(routable);
        let contract = self.tokens.iter().filter(|t| t.is_contract()).filter(routable);
        native.chain(contract).collect()
    }

    pub fn deposit_binding(&self, token: &str, chain: &str) -> Option<&ChannelBinding> {
        self.token(token)?.deposit_binding(chain)
    }

    pub fn withdrawal_binding(&self, token: &str, chain: &str) -> Option<&ChannelBinding> {
        self.token(token)?.withdrawal_binding(chain)
    }

    /// Source chain to preselect for `token`
    ///
    /// Uses the deposit binding matching `query_chain` when there is one;
    /// otherwise falls back to Osmosis.
    pub fn default_source(&self, token: &str, query_chain: Option<&str>) -> String {
        query_chain
            .and_then(|q| self.deposit_binding(token, q))
            .map(|b| b.chain_name.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE_CHAIN.to_string())
    }

    /// Channel used when depositing `token` from `chain`
    pub fn deposit_channel(&self, token: &str, chain: &str) -> Option<String> {
        let binding = self.deposit_binding(token, chain)?;
        binding
            .channel_id
            .clone()
            .or_else(|| self.chain(chain).map(|c| c.deposit_channel_id.clone()))
    }

    /// Channel used when withdrawing `token` to `chain`
    pub fn withdrawal_channel(&self, token: &str, chain: &str) -> Option<String> {
        let binding = self.withdrawal_binding(token, chain)?;
        binding
            .channel_id
            .clone()
            .or_else(|| self.chain(chain).map(|c| c.withdraw_channel_id.clone()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_chain() {
        let registry = Registry::mainnet();
        let home = registry.home_chain().unwrap();
        assert_eq!(home.chain_id, "morocco-1");
        assert_eq!(home.bech32_prefix, "terp");
        assert_eq!(home.gas_denom, "uthiol");
        assert_eq!(registry.remote_chains().count(), registry.chains().len() - 1);
    }

    #[test]
    fn test_chain_lookup_by_name_or_id() {
        let registry = Registry::mainnet();
        assert_eq!(registry.chain("osmosis").unwrap().chain_id, "osmosis-1");
        assert_eq!(registry.chain("osmosis-1").unwrap().chain_name, "Osmosis");
        assert!(registry.chain("nowhere").is_none());
    }

    #[test]
    fn test_supported_tokens_native_first() {
        let registry = Registry::mainnet();
        let names: Vec<_> = registry
            .supported_tokens("Cosmos Hub")
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["TERP", "ATOM", "sATOM"]);

        let osmosis: Vec<_> = registry
            .supported_tokens("Osmosis")
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert!(osmosis.contains(&"THIOL".to_string()));
        assert!(!osmosis.contains(&"sATOM".to_string()));
    }

    #[test]
    fn test_default_source() {
        let registry = Registry::mainnet();
        assert_eq!(registry.default_source("TERP", Some("juno")), "Juno");
        assert_eq!(registry.default_source("THIOL", Some("juno")), "osmosis");
        assert_eq!(registry.default_source("TERP", None), "osmosis");
    }

    #[test]
    fn test_channel_resolution() {
        let registry = Registry::mainnet();
        assert_eq!(
            registry.deposit_channel("TERP", "Osmosis").as_deref(),
            Some("channel-8691")
        );
        assert_eq!(
            registry.withdrawal_channel("TERP", "Osmosis").as_deref(),
            Some("channel-2")
        );
        assert!(registry.deposit_channel("THIOL", "Juno").is_none());
    }

    #[test]
    fn test_lcd_overrides() {
        let registry = Registry::mainnet()
            .with_home_lcd("http://127.0.0.1:1317")
            .with_chain_lcd("osmosis", "http://127.0.0.1:1318");
        assert_eq!(registry.home_chain().unwrap().lcd, "http://127.0.0.1:1317");
        assert_eq!(registry.chain("Osmosis").unwrap().lcd, "http://127.0.0.1:1318");
    }
}
