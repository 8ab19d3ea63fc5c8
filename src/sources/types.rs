//! Wire types for the three remote sources
//!
//! Everything is lenient: missing fields fall back to defaults so that one
//! odd vault does not reject the whole listing.

use serde::{Deserialize, Serialize};

// ============================================
// PRIMARY LISTING (yDaemon)
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiVault {
    pub address: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub token: Option<ApiToken>,

    #[serde(default)]
    pub strategies: Vec<ApiStrategy>,
}

impl ApiVault {
    /// `display_name` when set, `name` otherwise
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(display) if !display.is_empty() => display,
            _ => &self.name,
        }
    }
}

/// Underlying token of a vault
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub address: String,

    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiStrategy {
    pub address: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub risk: RiskScores,
}

/// The eight risk sub-scores attached to every strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScores {
    #[serde(rename = "TVLImpact")]
    pub tvl_impact: f64,
    #[serde(rename = "auditScore")]
    pub audit_score: f64,
    #[serde(rename = "codeReviewScore")]
    pub code_review_score: f64,
    #[serde(rename = "complexityScore")]
    pub complexity_score: f64,
    #[serde(rename = "longevityImpact")]
    pub longevity_impact: f64,
    #[serde(rename = "protocolSafetyScore")]
    pub protocol_safety_score: f64,
    #[serde(rename = "teamKnowledgeScore")]
    pub team_knowledge_score: f64,
    #[serde(rename = "testingScore")]
    pub testing_score: f64,
}

impl RiskScores {
    pub fn total(&self) -> f64 {
        self.tvl_impact
            + self.audit_score
            + self.code_review_score
            + self.complexity_score
            + self.longevity_impact
            + self.protocol_safety_score
            + self.team_knowledge_score
            + self.testing_score
    }

    /// A strategy has been scored when its sub-scores sum above zero.
    /// Individual fields are not checked.
    pub fn is_scored(&self) -> bool {
        self.total() > 0.0
    }
}

// ============================================
// LEDGER PLUGIN REGISTRY (b2c.json)
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSupport {
    #[serde(default)]
    pub contracts: Vec<LedgerContract>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerContract {
    pub address: String,

    #[serde(default, rename = "contractName")]
    pub contract_name: String,
}

// ============================================
// RISK FRAMEWORK (risks.json)
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFrameworkEntry {
    pub network: u64,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub criteria: RiskCriteria,
}

/// Strategy selection rules of a risk group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCriteria {
    #[serde(rename = "nameLike")]
    pub name_like: Vec<String>,
    pub strategies: Vec<String>,
    pub exclude: Vec<String>,
}

// ============================================
// SNAPSHOT
// ============================================

/// The three sources as fetched for one network
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub vaults: Vec<ApiVault>,
    pub ledger: LedgerSupport,
    pub risk_framework: Vec<RiskFrameworkEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vault_listing() {
        let json = r#"[{
            "address": "0xdA816459F1AB5631232FE5e97a05BBBb94970c95",
            "name": "yvDAI",
            "display_name": "DAI yVault",
            "version": "0.4.3",
            "icon": "https://example.org/dai.png",
            "token": {"address": "0x6B175474E89094C44Da98b954EedcdeCB5BE3830", "icon": ""},
            "strategies": [{
                "address": "0x1676055fE954EE6fc388F9096210E5EbE0A9070c",
                "name": "StrategyLenderYieldOptimiser",
                "description": "Lends DAI",
                "risk": {
                    "TVLImpact": 1, "auditScore": 2, "codeReviewScore": 1,
                    "complexityScore": 1, "longevityImpact": 1,
                    "protocolSafetyScore": 1, "teamKnowledgeScore": 1, "testingScore": 1
                }
            }]
        }]"#;

        let vaults: Vec<ApiVault> = serde_json::from_str(json).unwrap();
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].label(), "DAI yVault");
        assert_eq!(vaults[0].strategies[0].risk.total(), 9.0);
        assert!(vaults[0].strategies[0].risk.is_scored());
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{"address": "0x0000000000000000000000000000000000000001",
            "strategies": [{"address": "0x0000000000000000000000000000000000000002"}]}"#;
        let vault: ApiVault = serde_json::from_str(json).unwrap();

        assert_eq!(vault.label(), "");
        assert!(vault.token.is_none());
        assert_eq!(vault.strategies[0].description, None);
        assert!(!vault.strategies[0].risk.is_scored());
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let vault = ApiVault {
            name: "yvUSDC".to_string(),
            display_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(vault.label(), "yvUSDC");
    }

    #[test]
    fn test_risk_sum_is_literal() {
        let zero = RiskScores::default();
        assert!(!zero.is_scored());

        let offset = RiskScores {
            audit_score: -1.0,
            testing_score: 2.0,
            ..Default::default()
        };
        assert!(offset.is_scored());

        let cancelled = RiskScores {
            audit_score: -2.0,
            testing_score: 2.0,
            ..Default::default()
        };
        assert!(!cancelled.is_scored());
    }

    #[test]
    fn test_parse_ledger_and_risk() {
        let ledger: LedgerSupport = serde_json::from_str(
            r#"{"name": "Yearn", "contracts": [{"address": "0xabc", "contractName": "yvDAI"}]}"#,
        )
        .unwrap();
        assert_eq!(ledger.contracts[0].contract_name, "yvDAI");

        let risks: Vec<RiskFrameworkEntry> = serde_json::from_str(
            r#"[{"network": 1, "label": "Curve", "criteria": {"nameLike": ["curve"], "strategies": [], "exclude": []}},
                {"network": 250}]"#,
        )
        .unwrap();
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].criteria.name_like, vec!["curve".to_string()]);
        assert!(risks[1].criteria.strategies.is_empty());
    }
}
