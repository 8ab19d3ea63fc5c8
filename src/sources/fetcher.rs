//! Source Fetcher
//!
//! Pulls the vault listing, the Ledger registry and the risk framework in
//! parallel. One failing request fails the whole snapshot.

use eyre::{Result, WrapErr};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::{ApiVault, LedgerSupport, RiskFrameworkEntry, SourceSnapshot};
use crate::config::Config;

/// Anything that can produce a full snapshot for a network
pub trait SnapshotSource {
    fn fetch_snapshot(
        &self,
        chain_id: u64,
    ) -> impl Future<Output = Result<SourceSnapshot>> + Send;
}

pub struct SourceFetcher {
    http_client: Client,
    config: Config,
}

impl SourceFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, source: &str, url: &str) -> Result<T> {
        let start = Instant::now();

        let value = self
            .http_client
            .get(url)
            .send()
            .await
            .wrap_err_with(|| format!("{} request failed ({})", source, url))?
            .error_for_status()
            .wrap_err_with(|| format!("{} returned an error status", source))?
            .json::<T>()
            .await
            .wrap_err_with(|| format!("{} returned malformed JSON", source))?;

        debug!("{} fetched in {:?}", source, start.elapsed());
        Ok(value)
    }

    pub async fn fetch_vaults(&self, chain_id: u64) -> Result<Vec<ApiVault>> {
        self.get_json("vault listing", &self.config.vaults_url(chain_id)).await
    }

    pub async fn fetch_ledger_support(&self) -> Result<LedgerSupport> {
        self.get_json("ledger registry", &self.config.ledger_support_url).await
    }

    pub async fn fetch_risk_framework(&self) -> Result<Vec<RiskFrameworkEntry>> {
        self.get_json("risk framework", &self.config.risk_framework_url).await
    }
}

impl SnapshotSource for SourceFetcher {
    async fn fetch_snapshot(&self, chain_id: u64) -> Result<SourceSnapshot> {
        let start = Instant::now();

        let (vaults, ledger, risk_framework) = tokio::try_join!(
            self.fetch_vaults(chain_id),
            self.fetch_ledger_support(),
            self.fetch_risk_framework(),
        )?;

        info!(
            "Fetched {} vaults, {} ledger contracts, {} risk groups for chain {} in {:?}",
            vaults.len(),
            ledger.contracts.len(),
            risk_framework.len(),
            chain_id,
            start.elapsed()
        );

        Ok(SourceSnapshot {
            vaults,
            ledger,
            risk_framework,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_source_fails_snapshot() {
        let mut config = Config::default();
        // Port 9 (discard) on localhost: connection refused, no network needed
        config.vaults_api_url = "http://127.0.0.1:9".to_string();
        config.ledger_support_url = "http://127.0.0.1:9/b2c.json".to_string();
        config.risk_framework_url = "http://127.0.0.1:9/risks.json".to_string();
        config.request_timeout_secs = 2;

        let fetcher = SourceFetcher::new(&config).unwrap();
        assert!(fetcher.fetch_snapshot(1).await.is_err());
    }
}
