//! Vault cards
//!
//! Decides, per vault, whether anything is shown and which check sections
//! make it to the screen.

use alloy_primitives::Address;
use serde::Serialize;

use super::Settings;
use crate::aggregator::{checksum, VaultRecord};
use crate::network;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Icon,
    Ledger,
    Strategies,
    Risk,
    Description,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Icon => "Icon",
            Category::Ledger => "Ledger Live",
            Category::Strategies => "Strategies",
            Category::Risk => "Risk Score",
            Category::Description => "Descriptions",
        }
    }
}

/// What a status line can open in the remediation panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixTarget {
    Ledger,
    Description {
        strategy_name: String,
        strategy_address: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub valid: bool,
    pub prefix: String,
    pub suffix: String,
    /// Explorer link for strategy lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixTarget>,
}

impl StatusLine {
    fn new(valid: bool, prefix: &str, suffix: &str) -> Self {
        Self {
            valid,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            link: None,
            fix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub category: Category,
    pub lines: Vec<StatusLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultCard {
    pub address: String,
    pub name: String,
    pub version: String,
    pub icon_url: String,
    pub anomalies: usize,
    pub sections: Vec<Section>,
    #[serde(skip)]
    pub raw_address: Address,
}

impl VaultCard {
    pub fn section(&self, category: Category) -> Option<&Section> {
        self.sections.iter().find(|s| s.category == category)
    }
}

/// `None` when the vault is clean and only anomalies are requested
pub fn present(record: &VaultRecord, settings: &Settings, chain_id: u64) -> Option<VaultCard> {
    let only_anomalies = settings.show_only_anomalies;
    if only_anomalies && !record.has_anomalies() {
        return None;
    }

    let mut sections = Vec::new();

    if !(only_anomalies && record.has_valid_icon && record.has_valid_token_icon) {
        sections.push(Section {
            category: Category::Icon,
            lines: vec![
                StatusLine::new(record.has_valid_icon, "Icon", "for vault"),
                StatusLine::new(record.has_valid_token_icon, "Icon", "for underlying token"),
            ],
        });
    }

    if !(only_anomalies && record.has_ledger_integration) {
        let mut line = StatusLine::new(record.has_ledger_integration, "Ledger integration", "for vault");
        if !record.has_ledger_integration {
            line.fix = Some(FixTarget::Ledger);
        }
        sections.push(Section {
            category: Category::Ledger,
            lines: vec![line],
        });
    }

    // Always shown, whatever the filter
    if !record.has_strategies() {
        sections.push(Section {
            category: Category::Strategies,
            lines: vec![StatusLine::new(false, "No strategies for this vault:", "")],
        });
    }

    if !(only_anomalies && record.has_valid_strategies_risk) {
        sections.push(Section {
            category: Category::Risk,
            lines: record
                .strategies
                .iter()
                .map(|strategy| {
                    let address = strategy.display_address();
                    let suffix = match &strategy.risk_group {
                        Some(group) => format!("for strategy {} (risk group: {})", strategy.name, group),
                        None => format!("for strategy {}", strategy.name),
                    };
                    let mut line = StatusLine::new(strategy.has_risk_score(), "Risk", &suffix);
                    line.link = Some(network::explorer_address_link(chain_id, &address));
                    line
                })
                .collect(),
        });
    }

    if !(only_anomalies && record.has_valid_strategies_descriptions) {
        sections.push(Section {
            category: Category::Description,
            lines: record
                .strategies
                .iter()
                .map(|strategy| {
                    let address = strategy.display_address();
                    let mut line = StatusLine::new(
                        strategy.has_description(),
                        "Description",
                        &format!("for strategy {}", strategy.name),
                    );
                    line.link = Some(network::explorer_address_link(chain_id, &address));
                    line.fix = Some(FixTarget::Description {
                        strategy_name: strategy.name.clone(),
                        strategy_address: address,
                    });
                    line
                })
                .collect(),
        });
    }

    Some(VaultCard {
        address: checksum(&record.address),
        name: record.name.clone(),
        version: record.version.clone(),
        icon_url: record.icon_url(chain_id),
        anomalies: record.anomaly_count(),
        sections,
        raw_address: record.address,
    })
}
