//! Risk framework matching
//!
//! The framework groups strategies by explicit address or by name fragment.
//! Matches are informational: the risk flag is computed from the sub-scores.

use alloy_primitives::Address;

use super::record::normalize_address;
use crate::sources::RiskFrameworkEntry;

/// Entries that apply to `chain_id`
pub fn for_network(entries: &[RiskFrameworkEntry], chain_id: u64) -> Vec<RiskFrameworkEntry> {
    entries
        .iter()
        .filter(|entry| entry.network == chain_id)
        .cloned()
        .collect()
}

impl RiskFrameworkEntry {
    /// (listed by address OR name contains a `nameLike` fragment) AND name not excluded
    pub fn covers(&self, strategy_address: &Address, strategy_name: &str) -> bool {
        let criteria = &self.criteria;

        let in_strategies = criteria
            .strategies
            .iter()
            .filter_map(|raw| normalize_address(raw))
            .any(|address| &address == strategy_address);

        let lowered = strategy_name.to_lowercase();
        let in_name_like = criteria
            .name_like
            .iter()
            .any(|fragment| lowered.contains(&fragment.to_lowercase()));

        let excluded = criteria.exclude.iter().any(|name| name == strategy_name);

        (in_strategies || in_name_like) && !excluded
    }
}

/// Label of the first group covering the strategy. Unlabelled groups report "unnamed".
pub fn match_group(
    entries: &[RiskFrameworkEntry],
    strategy_address: &Address,
    strategy_name: &str,
) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.covers(strategy_address, strategy_name))
        .map(|entry| entry.label.clone().unwrap_or_else(|| "unnamed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::RiskCriteria;
    use alloy_primitives::address;

    fn entry(network: u64, label: &str, criteria: RiskCriteria) -> RiskFrameworkEntry {
        RiskFrameworkEntry {
            network,
            label: Some(label.to_string()),
            criteria,
        }
    }

    #[test]
    fn test_for_network() {
        let entries = vec![
            entry(1, "Curve", RiskCriteria::default()),
            entry(250, "Geist", RiskCriteria::default()),
            entry(1, "Convex", RiskCriteria::default()),
        ];
        let mainnet = for_network(&entries, 1);
        assert_eq!(mainnet.len(), 2);
        assert!(mainnet.iter().all(|e| e.network == 1));
        assert!(for_network(&entries, 10).is_empty());
    }

    #[test]
    fn test_covers_by_name_and_address() {
        let strategy = address!("1676055fE954EE6fc388F9096210E5EbE0A9070c");
        let curve = entry(
            1,
            "Curve",
            RiskCriteria {
                name_like: vec!["Curve".to_string()],
                strategies: vec![],
                exclude: vec!["CurveExcluded".to_string()],
            },
        );
        assert!(curve.covers(&strategy, "StrategyCurveTricrypto"));
        assert!(!curve.covers(&strategy, "CurveExcluded"));
        assert!(!curve.covers(&strategy, "StrategyLender"));

        let pinned = entry(
            1,
            "Pinned",
            RiskCriteria {
                name_like: vec![],
                strategies: vec!["0x1676055fe954ee6fc388f9096210e5ebe0a9070c".to_string()],
                exclude: vec![],
            },
        );
        assert!(pinned.covers(&strategy, "Anything"));
        assert_eq!(
            match_group(&[curve, pinned], &strategy, "StrategyLender"),
            Some("Pinned".to_string())
        );
    }
}
