//! Remediation panel
//!
//! Step-by-step instructions for fixing a missing Ledger integration or a
//! missing strategy description. Snippets are the literal text to paste.

use serde::Serialize;

const LEDGER_B2C_URL: &str =
    "https://github.com/LedgerHQ/app-plugin-yearn/blob/develop/tests/yearn/b2c.json";
const LEDGER_ABIS_URL: &str =
    "https://github.com/LedgerHQ/app-plugin-yearn/tree/develop/tests/yearn/abis";
const LEDGER_ABI_TEMPLATE: &str = "_vault_v0.4.3.json";
const META_STRATEGIES_URL: &str = "https://github.com/yearn/yearn-meta/tree/master/data/strategies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixCategory {
    Ledger,
    Description,
}

impl std::fmt::Display for FixCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixCategory::Ledger => write!(f, "ledger"),
            FixCategory::Description => write!(f, "description"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Link(String),
    /// Copyable literal
    Snippet(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub step: String,
    pub segments: Vec<Segment>,
}

impl Instruction {
    fn new(step: &str) -> Self {
        Self {
            step: step.to_string(),
            segments: Vec::new(),
        }
    }

    fn text(mut self, text: &str) -> Self {
        self.segments.push(Segment::Text(text.to_string()));
        self
    }

    fn link(mut self, url: &str) -> Self {
        self.segments.push(Segment::Link(url.to_string()));
        self
    }

    fn snippet(mut self, value: &str) -> Self {
        self.segments.push(Segment::Snippet(value.to_string()));
        self
    }

    /// Instruction as plain text
    pub fn plain(&self) -> String {
        let body: String = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.as_str(),
                Segment::Link(url) => url.as_str(),
                Segment::Snippet(value) => value.as_str(),
            })
            .collect();
        format!("{}. {}", self.step, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixPayload {
    pub category: FixCategory,
    pub address: String,
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl FixPayload {
    pub fn snippets(&self) -> Vec<&str> {
        self.instructions
            .iter()
            .flat_map(|instruction| &instruction.segments)
            .filter_map(|segment| match segment {
                Segment::Snippet(value) => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub fn ledger_fix(vault_address: &str, vault_name: &str) -> FixPayload {
    FixPayload {
        category: FixCategory::Ledger,
        address: vault_address.to_string(),
        name: vault_name.to_string(),
        instructions: vec![
            Instruction::new("1")
                .text("Access the Ledger's B2C file for Yearn on GitHub: ")
                .link(LEDGER_B2C_URL),
            Instruction::new("2")
                .text("Append the following snippet at the end of the ")
                .snippet("contracts")
                .text(" object in the ")
                .snippet("b2c.json")
                .text(" file."),
            Instruction::new("3")
                .text("Access the Ledger's ABIs folder for Yearn on GitHub: ")
                .link(LEDGER_ABIS_URL),
            Instruction::new("4")
                .text("Clone and rename ")
                .snippet(LEDGER_ABI_TEMPLATE)
                .text(" to ")
                .snippet(&format!("{}.json", vault_address)),
        ],
    }
}

pub fn description_fix(
    chain_id: u64,
    vault_address: &str,
    vault_name: &str,
    strategy_name: &str,
    strategy_address: &str,
) -> FixPayload {
    let folder = format!("{}/{}", META_STRATEGIES_URL, chain_id);

    FixPayload {
        category: FixCategory::Description,
        address: vault_address.to_string(),
        name: vault_name.to_string(),
        instructions: vec![
            Instruction::new("1")
                .text("Access the Strategies folder in the meta repo: ")
                .link(&folder),
            Instruction::new("2")
                .text("Select the file in which the strategy ")
                .snippet(strategy_name)
                .text(" should belong to."),
            Instruction::new("3a")
                .text("If the file exists, append the address of the strategy to the file, under \"addresses\": ")
                .snippet(strategy_address),
            Instruction::new("3b")
                .text("If the file does not exist, create a new one and append the address of the strategy to the file, under \"addresses\": ")
                .snippet(strategy_address),
        ],
    }
}

/// Open/closed panel. Opening replaces whatever was shown before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FixPanel {
    #[default]
    Closed,
    Open(FixPayload),
}

impl FixPanel {
    pub fn open(&mut self, payload: FixPayload) {
        *self = FixPanel::Open(payload);
    }

    pub fn close(&mut self) {
        *self = FixPanel::Closed;
    }

    pub fn payload(&self) -> Option<&FixPayload> {
        match self {
            FixPanel::Open(payload) => Some(payload),
            FixPanel::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT: &str = "0xdA816459F1AB5631232FE5e97a05BBBb94970c95";
    const STRATEGY: &str = "0x1676055fE954EE6fc388F9096210E5EbE0A9070c";

    #[test]
    fn test_ledger_fix_embeds_vault_address() {
        let fix = ledger_fix(VAULT, "DAI yVault");
        assert_eq!(fix.category, FixCategory::Ledger);
        assert_eq!(fix.instructions.len(), 4);
        assert_eq!(
            fix.snippets(),
            vec![
                "contracts",
                "b2c.json",
                "_vault_v0.4.3.json",
                "0xdA816459F1AB5631232FE5e97a05BBBb94970c95.json"
            ]
        );
        assert_eq!(
            fix.instructions[0].plain(),
            format!("1. Access the Ledger's B2C file for Yearn on GitHub: {}", LEDGER_B2C_URL)
        );
    }

    #[test]
    fn test_description_fix_uses_network_folder() {
        let fix = description_fix(250, VAULT, "DAI yVault", "StrategyLender", STRATEGY);
        assert_eq!(fix.category, FixCategory::Description);
        assert_eq!(
            fix.instructions[0].segments[1],
            Segment::Link("https://github.com/yearn/yearn-meta/tree/master/data/strategies/250".to_string())
        );
        assert_eq!(fix.snippets(), vec!["StrategyLender", STRATEGY, STRATEGY]);
        assert_eq!(fix.instructions[2].step, "3a");
        assert_eq!(fix.instructions[3].step, "3b");
    }

    #[test]
    fn test_panel_state_machine() {
        let mut panel = FixPanel::default();
        assert!(panel.payload().is_none());

        panel.open(ledger_fix(VAULT, "DAI yVault"));
        assert_eq!(panel.payload().map(|p| p.category), Some(FixCategory::Ledger));

        // Opening again replaces the payload
        panel.open(description_fix(1, VAULT, "DAI yVault", "StrategyLender", STRATEGY));
        assert_eq!(panel.payload().map(|p| p.category), Some(FixCategory::Description));

        panel.close();
        assert_eq!(panel, FixPanel::Closed);
    }
}
