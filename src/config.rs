//! Configuration for the Vault Monitor
//!
//! Values come from the environment (with `.env` support) or a TOML file.
//! Command line flags are layered on top in `main`.

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::network;

// ============================================
// DEFAULT ENDPOINTS
// ============================================

pub const DEFAULT_VAULTS_API_URL: &str = "https://ydaemon.yearn.finance";

pub const DEFAULT_LEDGER_SUPPORT_URL: &str =
    "https://raw.githubusercontent.com/LedgerHQ/app-plugin-yearn/develop/tests/yearn/b2c.json";

pub const DEFAULT_RISK_FRAMEWORK_URL: &str =
    "https://raw.githubusercontent.com/yearn/yearn-data-analytics/master/src/risk_framework/risks.json";

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========== Network Settings ==========
    /// Network to audit (1 = Ethereum Mainnet)
    pub chain_id: u64,

    // ========== Data Sources ==========
    /// Base URL of the vault listing API (`{base}/{chain}/vaults/all`)
    pub vaults_api_url: String,

    /// Ledger plugin registry (`contracts[]`)
    pub ledger_support_url: String,

    /// Risk framework reference list
    pub risk_framework_url: String,

    // ========== Display ==========
    /// Hide vaults and sections without anomalies
    pub show_only_anomalies: bool,

    // ========== HTTP ==========
    /// Per-request timeout for every HTTP call
    pub request_timeout_secs: u64,

    /// Maximum icon probes in flight
    pub probe_concurrency: usize,

    // ========== Watch Mode ==========
    /// Seconds between refresh cycles
    pub refresh_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(defaults.chain_id),

            vaults_api_url: env::var("VAULTS_API_URL").unwrap_or(defaults.vaults_api_url),
            ledger_support_url: env::var("LEDGER_SUPPORT_URL")
                .unwrap_or(defaults.ledger_support_url),
            risk_framework_url: env::var("RISK_FRAMEWORK_URL")
                .unwrap_or(defaults.risk_framework_url),

            show_only_anomalies: env::var("SHOW_ONLY_ANOMALIES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(defaults.request_timeout_secs),
            probe_concurrency: env::var("PROBE_CONCURRENCY")
                .unwrap_or_else(|_| "16".to_string())
                .parse()
                .unwrap_or(defaults.probe_concurrency),

            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(defaults.refresh_interval_secs),
        })
    }

    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Primary listing URL for a network
    pub fn vaults_url(&self, chain_id: u64) -> String {
        format!(
            "{}/{}/vaults/all?classification=any&strategiesRisk=withRisks",
            self.vaults_api_url.trim_end_matches('/'),
            chain_id
        )
    }

    pub fn validate(&self) -> Result<()> {
        for (key, url) in [
            ("VAULTS_API_URL", &self.vaults_api_url),
            ("LEDGER_SUPPORT_URL", &self.ledger_support_url),
            ("RISK_FRAMEWORK_URL", &self.risk_framework_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(eyre!("Invalid {} - expected an http(s) URL, got {:?}", key, url));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(eyre!("REQUEST_TIMEOUT_SECS must be greater than 0"));
        }
        if self.probe_concurrency == 0 {
            return Err(eyre!("PROBE_CONCURRENCY must be greater than 0"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(eyre!("REFRESH_INTERVAL_SECS must be greater than 0"));
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              VAULT MONITOR - CONFIGURATION                 ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!(
            "║ Network:           {:^40} ║",
            format!("{} ({})", network::chain_name(self.chain_id), self.chain_id)
        );
        println!(
            "║ Only anomalies:    {:^40} ║",
            if self.show_only_anomalies { "✓ Yes" } else { "✗ No" }
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SOURCES                                                    ║");
        println!("║ • Vaults API:      {:<40} ║", truncate(&self.vaults_api_url, 40));
        println!("║ • Ledger registry: {:<40} ║", truncate(&self.ledger_support_url, 40));
        println!("║ • Risk framework:  {:<40} ║", truncate(&self.risk_framework_url, 40));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ HTTP                                                       ║");
        println!("║ • Timeout:         {:>38} s ║", self.request_timeout_secs);
        println!("║ • Probe workers:   {:>40} ║", self.probe_concurrency);
        println!("║ • Refresh every:   {:>38} s ║", self.refresh_interval_secs);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let head: String = value.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", head)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: network::PRIMARY_CHAIN_ID,
            vaults_api_url: DEFAULT_VAULTS_API_URL.to_string(),
            ledger_support_url: DEFAULT_LEDGER_SUPPORT_URL.to_string(),
            risk_framework_url: DEFAULT_RISK_FRAMEWORK_URL.to_string(),
            show_only_anomalies: false,
            request_timeout_secs: 15,
            probe_concurrency: 16,
            refresh_interval_secs: 60,
        }
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chain_id, 1);
        assert!(!config.show_only_anomalies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_vaults_url() {
        let mut config = Config::default();
        config.vaults_api_url = "https://example.org/".to_string();
        assert_eq!(
            config.vaults_url(250),
            "https://example.org/250/vaults/all?classification=any&strategiesRisk=withRisks"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.ledger_support_url = "ftp://nope".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.probe_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("chain_id = 250\nshow_only_anomalies = true\n").unwrap();
        assert_eq!(config.chain_id, 250);
        assert!(config.show_only_anomalies);
        assert_eq!(config.vaults_api_url, DEFAULT_VAULTS_API_URL);
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
