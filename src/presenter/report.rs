use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use serde::Serialize;

use super::card::VaultCard;
use super::{cards, summarize, Settings, Summary};
use crate::aggregator::{CycleFailure, StoreState};
use crate::network;

/// Machine-readable scan result (`scan --json`)
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub chain_id: Option<u64>,
    pub network: Option<&'static str>,
    pub revision: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    pub show_only_anomalies: bool,
    pub summary: Summary,
    pub vaults: Vec<VaultCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<FailureReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub chain_id: u64,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl From<&CycleFailure> for FailureReport {
    fn from(failure: &CycleFailure) -> Self {
        Self {
            chain_id: failure.chain_id,
            message: failure.message.clone(),
            at: failure.at,
        }
    }
}

impl Report {
    pub fn build(state: &StoreState, settings: &Settings) -> Self {
        Self {
            generated_at: Utc::now(),
            chain_id: state.chain_id,
            network: state.chain_id.map(network::chain_name),
            revision: state.revision,
            fetched_at: state.fetched_at,
            show_only_anomalies: settings.show_only_anomalies,
            summary: summarize(state, settings),
            vaults: cards(state, settings),
            last_failure: state.last_failure.as_ref().map(FailureReport::from),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("Failed to serialize report")
    }
}
