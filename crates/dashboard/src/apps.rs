//! App directory listing

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use terpdash_core::MetricsError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::fetch::MarketClient;

/// Wait between failed directory fetches
pub const APPS_RETRY_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppEntry {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub logo_url: Option<String>,
    pub link: Option<String>,
}

impl AppEntry {
    /// Parse one CMS record (`{"attributes": {...}}`); `None` without a name
    pub fn from_json(record: &Value) -> Option<Self> {
        let attrs = &record["attributes"];
        let name = attrs["name"].as_str()?.to_string();
        let tags = attrs["type"]
            .as_array()
            .map(|types| {
                types
                    .iter()
                    .filter_map(|t| t["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            name,
            description: attrs["description"].as_str().unwrap_or_default().to_string(),
            tags,
            logo_url: attrs["logo"]["data"]["attributes"]["url"]
                .as_str()
                .map(str::to_string),
            link: attrs["link"].as_str().map(str::to_string),
        })
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }

    fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Apps sorted by name
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppDirectory {
    apps: Vec<AppEntry>,
}

impl AppDirectory {
    pub fn new(mut apps: Vec<AppEntry>) -> Self {
        apps.sort_by_key(|a| a.name.to_lowercase());
        Self { apps }
    }

    /// Build from the CMS payload (`{"data": [...]}`)
    pub fn from_json(body: &Value) -> Result<Self, MetricsError> {
        let records = body["data"].as_array().ok_or_else(|| MetricsError::Parse {
            source_name: "apps",
            message: "missing data array".to_string(),
        })?;
        Ok(Self::new(records.iter().filter_map(AppEntry::from_json).collect()))
    }

    pub fn apps(&self) -> &[AppEntry] {
        &self.apps
    }

    /// Every tag used by any app, sorted and unique
    pub fn tags(&self) -> Vec<String> {
        self.apps
            .iter()
            .flat_map(|a| a.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Case-insensitive name search, then keep apps carrying any of `tags`
    ///
    /// An empty search or tag list does not filter.
    pub fn filter(&self, search: &str, tags: &[String]) -> Vec<AppEntry> {
        let needle = search.trim().to_lowercase();
        self.apps
            .iter()
            .filter(|a| needle.is_empty() || a.matches_search(&needle))
            .filter(|a| tags.is_empty() || a.has_any_tag(tags))
            .cloned()
            .collect()
    }
}

/// Fetch the directory, retrying every `retry` until it succeeds
pub async fn load_with_retry(market: &MarketClient, retry: Duration) -> AppDirectory {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match market.apps().await.and_then(|body| AppDirectory::from_json(&body)) {
            Ok(directory) => {
                tracing::info!(apps = directory.apps().len(), attempt, "Loaded app directory");
                return directory;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "App directory fetch failed, retrying");
                tokio::time::sleep(retry).await;
            }
        }
    }
}

/// Load the directory in the background and publish it into `slot`
///
/// Abort the returned handle at shutdown to stop retrying.
pub fn spawn_loader(
    market: MarketClient,
    slot: Arc<RwLock<Option<AppDirectory>>>,
    retry: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let directory = load_with_retry(&market, retry).await;
        *slot.write().await = Some(directory);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use terpdash_core::MarketConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(name: &str, tags: &[&str]) -> Value {
        json!({"id": 1, "attributes": {
            "name": name,
            "description": format!("{} on Terp", name),
            "link": format!("https://{}.example", name.to_lowercase()),
            "type": tags.iter().map(|t| json!({"name": t})).collect::<Vec<_>>(),
            "logo": {"data": {"attributes": {"url": "/uploads/logo.png"}}}
        }})
    }

    fn listing() -> Value {
        json!({"data": [
            record("zeta swap", &["DeFi", "DEX"]),
            record("Alpha NFTs", &["NFT"]),
            record("beta bridge", &["DeFi", "Bridge"]),
            {"attributes": {"description": "nameless"}}
        ]})
    }

    #[test]
    fn test_sorted_and_tags() {
        let dir = AppDirectory::from_json(&listing()).unwrap();
        let names: Vec<_> = dir.apps().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha NFTs", "beta bridge", "zeta swap"]);
        assert_eq!(dir.tags(), vec!["Bridge", "DEX", "DeFi", "NFT"]);
        assert_eq!(dir.apps()[0].logo_url.as_deref(), Some("/uploads/logo.png"));
    }

    #[test]
    fn test_filter() {
        let dir = AppDirectory::from_json(&listing()).unwrap();
        assert_eq!(dir.filter("", &[]).len(), 3);
        assert_eq!(dir.filter("ALPHA", &[])[0].name, "Alpha NFTs");

        let defi = vec!["DeFi".to_string()];
        let names: Vec<_> = dir.filter("", &defi).into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["beta bridge", "zeta swap"]);

        assert!(dir.filter("alpha", &defi).is_empty());
    }

    #[tokio::test]
    async fn test_loader_retries_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dapps"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dapps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .mount(&server)
            .await;

        let market = MarketClient::new(
            reqwest::Client::new(),
            MarketConfig {
                apps_url: format!("{}/api/dapps", server.uri()),
                ..Default::default()
            },
        );
        let slot = Arc::new(RwLock::new(None));
        spawn_loader(market, slot.clone(), Duration::from_millis(10))
            .await
            .unwrap();

        let dir = slot.read().await.clone().unwrap();
        assert_eq!(dir.apps().len(), 3);
    }
}
