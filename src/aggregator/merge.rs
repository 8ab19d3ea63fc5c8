//! Snapshot → AggregatedView
//!
//! Pure function of the fetched sources and the network. The only flags not
//! decided here are the two icon flags, which start true and are revised by
//! probes later.

use tracing::{debug, warn};

use super::record::{
    normalize_address, AggregatedView, StrategyRecord, TokenRecord, VaultRecord,
};
use super::risk_groups;
use crate::network;
use crate::sources::{ApiStrategy, ApiVault, LedgerSupport, RiskFrameworkEntry, SourceSnapshot};

pub fn aggregate(snapshot: &SourceSnapshot, chain_id: u64) -> AggregatedView {
    let risk_framework = risk_groups::for_network(&snapshot.risk_framework, chain_id);
    let mut view = AggregatedView::new();

    // Ledger Live only ships on mainnet: everywhere else it is not an anomaly
    let ledger_default = !network::requires_ledger_integration(chain_id);

    for vault in &snapshot.vaults {
        let Some(record) = build_record(vault, ledger_default, &risk_framework) else {
            warn!("Skipping vault with unparseable address {:?}", vault.address);
            continue;
        };
        let address = record.address;
        if !view.insert_listed(record) {
            debug!("Duplicate vault {} in listing, keeping the first entry", address);
        }
    }

    merge_ledger_support(&mut view, &snapshot.ledger);

    view
}

fn build_record(
    vault: &ApiVault,
    has_ledger_integration: bool,
    risk_framework: &[RiskFrameworkEntry],
) -> Option<VaultRecord> {
    let address = normalize_address(&vault.address)?;

    let strategies: Vec<StrategyRecord> = vault
        .strategies
        .iter()
        .map(|strategy| build_strategy(strategy, risk_framework))
        .collect();

    let token = vault.token.as_ref().and_then(|token| {
        normalize_address(&token.address).map(|token_address| TokenRecord {
            address: token_address,
            icon: token.icon.clone(),
        })
    });

    Some(VaultRecord {
        address,
        name: vault.label().to_string(),
        version: vault.version.clone(),
        icon: vault.icon.clone(),
        token,
        has_valid_strategies_descriptions: strategies.iter().all(StrategyRecord::has_description),
        has_valid_strategies_risk: strategies.iter().all(StrategyRecord::has_risk_score),
        strategies,
        integration_label: None,
        in_listing: true,
        has_valid_icon: true,
        has_valid_token_icon: true,
        has_ledger_integration,
    })
}

/// Strategies with an unparseable address are kept: they still count towards
/// the vault flags and are shown with the address as listed.
fn build_strategy(strategy: &ApiStrategy, risk_framework: &[RiskFrameworkEntry]) -> StrategyRecord {
    let address = normalize_address(&strategy.address);
    if address.is_none() {
        warn!("Strategy {:?} has an unparseable address {:?}", strategy.name, strategy.address);
    }

    StrategyRecord {
        address,
        raw_address: strategy.address.clone(),
        name: strategy.name.clone(),
        description: strategy.description.clone().unwrap_or_default(),
        risk: strategy.risk,
        risk_group: address.and_then(|address| {
            risk_groups::match_group(risk_framework, &address, &strategy.name)
        }),
    }
}

/// Registry entries either create a bare record or flip the integration flag
/// of an existing one. Nothing else on an existing record is touched.
fn merge_ledger_support(view: &mut AggregatedView, ledger: &LedgerSupport) {
    for contract in &ledger.contracts {
        let Some(address) = normalize_address(&contract.address) else {
            warn!("Skipping ledger contract with unparseable address {:?}", contract.address);
            continue;
        };

        match view.record_mut(&address) {
            Some(record) => record.has_ledger_integration = true,
            None => view.insert_unlisted(VaultRecord::integration_only(
                address,
                &contract.contract_name,
            )),
        }
    }
}
