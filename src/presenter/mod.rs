//! The Presenter
//!
//! Turns the published store state into vault cards, renders them for the
//! terminal or as a JSON report, and builds remediation instructions.

mod card;
mod remediation;
mod render;
mod report;

pub use remediation::{description_fix, ledger_fix, FixCategory, FixPanel};
pub use render::{render_dashboard, render_fix};
pub use report::Report;

use serde::Serialize;

use card::{present, VaultCard};
use crate::aggregator::StoreState;

/// Display settings owned by the presenter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub show_only_anomalies: bool,
}

impl Settings {
    pub fn toggle_anomalies(&mut self) {
        self.show_only_anomalies = !self.show_only_anomalies;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub listed: usize,
    pub with_anomalies: usize,
    pub shown: usize,
    /// Ledger registry entries absent from the listing
    pub integration_only: usize,
    pub risk_groups: usize,
}

/// Cards for the listed vaults, in listing order
pub fn cards(state: &StoreState, settings: &Settings) -> Vec<VaultCard> {
    let Some(chain_id) = state.chain_id else {
        return Vec::new();
    };
    state
        .view
        .listed()
        .filter_map(|record| present(record, settings, chain_id))
        .collect()
}

pub fn summarize(state: &StoreState, settings: &Settings) -> Summary {
    let listed: Vec<_> = state.view.listed().collect();
    Summary {
        listed: listed.len(),
        with_anomalies: listed.iter().filter(|r| r.has_anomalies()).count(),
        shown: cards(state, settings).len(),
        integration_only: state.view.integration_only().count(),
        risk_groups: state.risk_framework.len(),
    }
}
