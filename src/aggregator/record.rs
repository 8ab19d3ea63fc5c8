//! Aggregated vault / strategy records

use alloy_primitives::Address;
use std::collections::HashMap;

use crate::sources::RiskScores;

/// Icons with no URL in the listing are looked up in the yearn-assets repo
const ASSETS_ICON_BASE: &str =
    "https://raw.githubusercontent.com/yearn/yearn-assets/master/icons/multichain-tokens";

/// Canonical key for every record. Parsing is case-insensitive.
pub fn normalize_address(raw: &str) -> Option<Address> {
    raw.trim().parse::<Address>().ok()
}

/// EIP-55 form used everywhere an address is shown
pub fn checksum(address: &Address) -> String {
    address.to_checksum(None)
}

pub fn assets_icon_url(chain_id: u64, address: &Address) -> String {
    format!(
        "{}/{}/{}/logo-128.png",
        ASSETS_ICON_BASE,
        chain_id,
        checksum(address)
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRecord {
    /// `None` when the listing carries an address that does not parse
    pub address: Option<Address>,
    pub raw_address: String,
    pub name: String,
    pub description: String,
    pub risk: RiskScores,
    /// Risk framework group this strategy falls under, informational only
    pub risk_group: Option<String>,
}

impl StrategyRecord {
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }

    pub fn has_risk_score(&self) -> bool {
        self.risk.is_scored()
    }

    /// Checksummed address, or the listing's text when it does not parse
    pub fn display_address(&self) -> String {
        match &self.address {
            Some(address) => checksum(address),
            None => self.raw_address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub address: Address,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VaultRecord {
    pub address: Address,
    pub name: String,
    pub version: String,
    pub icon: String,
    pub token: Option<TokenRecord>,
    pub strategies: Vec<StrategyRecord>,

    /// Contract name from the Ledger registry, set only on registry-only records
    pub integration_label: Option<String>,

    /// False for records that only exist in the Ledger registry
    pub in_listing: bool,

    pub has_valid_icon: bool,
    pub has_valid_token_icon: bool,
    pub has_ledger_integration: bool,
    pub has_valid_strategies_descriptions: bool,
    pub has_valid_strategies_risk: bool,
}

impl VaultRecord {
    /// Record for an address only known to the Ledger registry
    pub fn integration_only(address: Address, contract_name: &str) -> Self {
        Self {
            address,
            name: String::new(),
            version: "Unknown".to_string(),
            icon: String::new(),
            token: None,
            strategies: Vec::new(),
            integration_label: (!contract_name.is_empty()).then(|| contract_name.to_string()),
            in_listing: false,
            has_valid_icon: false,
            has_valid_token_icon: false,
            has_ledger_integration: true,
            has_valid_strategies_descriptions: false,
            has_valid_strategies_risk: false,
        }
    }

    pub fn has_strategies(&self) -> bool {
        !self.strategies.is_empty()
    }

    pub fn has_anomalies(&self) -> bool {
        self.anomaly_count() > 0
    }

    /// Number of failing checks (each flag and the empty strategy list count once)
    pub fn anomaly_count(&self) -> usize {
        [
            !self.has_strategies(),
            !self.has_valid_icon,
            !self.has_valid_token_icon,
            !self.has_ledger_integration,
            !self.has_valid_strategies_descriptions,
            !self.has_valid_strategies_risk,
        ]
        .iter()
        .filter(|failing| **failing)
        .count()
    }

    pub fn icon_url(&self, chain_id: u64) -> String {
        if self.icon.is_empty() {
            assets_icon_url(chain_id, &self.address)
        } else {
            self.icon.clone()
        }
    }

    pub fn token_icon_url(&self, chain_id: u64) -> Option<String> {
        self.token.as_ref().map(|token| {
            if token.icon.is_empty() {
                assets_icon_url(chain_id, &token.address)
            } else {
                token.icon.clone()
            }
        })
    }

    pub fn strategy(&self, address: &Address) -> Option<&StrategyRecord> {
        self.strategies.iter().find(|s| s.address.as_ref() == Some(address))
    }
}

// ============================================
// ICON REPORTS
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Vault,
    Token,
}

impl std::fmt::Display for IconKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IconKind::Vault => write!(f, "vault icon"),
            IconKind::Token => write!(f, "token icon"),
        }
    }
}

/// Outcome of one deferred image load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconReport {
    /// Store revision the probe was issued against
    pub revision: u64,
    pub address: Address,
    pub kind: IconKind,
    pub success: bool,
}

// ============================================
// AGGREGATED VIEW
// ============================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedView {
    records: HashMap<Address, VaultRecord>,
    /// Primary listing order
    order: Vec<Address>,
}

impl AggregatedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &Address) -> Option<&VaultRecord> {
        self.records.get(address)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vaults from the primary listing, in listing order
    pub fn listed(&self) -> impl Iterator<Item = &VaultRecord> {
        self.order.iter().filter_map(|address| self.records.get(address))
    }

    /// Records only known to the Ledger registry
    pub fn integration_only(&self) -> impl Iterator<Item = &VaultRecord> {
        self.records.values().filter(|record| !record.in_listing)
    }

    pub(crate) fn insert_listed(&mut self, record: VaultRecord) -> bool {
        if self.records.contains_key(&record.address) {
            return false;
        }
        self.order.push(record.address);
        self.records.insert(record.address, record);
        true
    }

    pub(crate) fn record_mut(&mut self, address: &Address) -> Option<&mut VaultRecord> {
        self.records.get_mut(address)
    }

    pub(crate) fn insert_unlisted(&mut self, record: VaultRecord) {
        self.records.insert(record.address, record);
    }

    /// New view with one icon flag changed. `None` when the address is unknown
    /// or the flag already holds the reported value.
    pub fn with_icon_status(&self, address: &Address, kind: IconKind, valid: bool) -> Option<Self> {
        let current = self.records.get(address)?;
        let flag = match kind {
            IconKind::Vault => current.has_valid_icon,
            IconKind::Token => current.has_valid_token_icon,
        };
        if flag == valid {
            return None;
        }

        let mut next = self.clone();
        if let Some(record) = next.records.get_mut(address) {
            match kind {
                IconKind::Vault => record.has_valid_icon = valid,
                IconKind::Token => record.has_valid_token_icon = valid,
            }
        }
        Some(next)
    }
}
