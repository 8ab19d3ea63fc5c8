//! Terminal rendering

use console::style;

use super::card::{FixTarget, Section, StatusLine, VaultCard};
use super::remediation::{FixPayload, Segment};
use super::{cards, summarize, Settings};
use crate::aggregator::{checksum, StoreState};
use crate::network;

const RULE: &str = "═══════════════════════════════════════════════════════════════";

pub fn render_dashboard(state: &StoreState, settings: &Settings) -> String {
    let mut out = String::new();
    out.push_str(&render_header(state, settings));

    if state.chain_id.is_none() {
        out.push_str(&format!("{}\n", style("No data loaded yet.").yellow()));
        return out;
    }

    let cards = cards(state, settings);
    if cards.is_empty() {
        let message = if settings.show_only_anomalies {
            "No anomalies found."
        } else {
            "The listing is empty."
        };
        out.push_str(&format!("{}\n\n", style(message).green()));
    }
    for card in &cards {
        out.push_str(&render_card(card));
        out.push('\n');
    }

    if !settings.show_only_anomalies {
        out.push_str(&render_integration_only(state));
    }

    let summary = summarize(state, settings);
    out.push_str("Summary:\n");
    out.push_str(&format!("  • Vaults listed: {}\n", summary.listed));
    out.push_str(&format!("  • With anomalies: {}\n", summary.with_anomalies));
    out.push_str(&format!("  • Shown: {}\n", summary.shown));
    out.push_str(&format!(
        "  • Ledger-only contracts (not in listing): {}\n",
        summary.integration_only
    ));
    out.push_str(&format!("  • Risk framework groups: {}\n", summary.risk_groups));
    out
}

/// Ledger registry entries the listing does not know about
fn render_integration_only(state: &StoreState) -> String {
    let mut records: Vec<_> = state.view.integration_only().collect();
    if records.is_empty() {
        return String::new();
    }
    records.sort_by_key(|record| record.address);

    let mut out = format!("{}\n", style("Ledger-only contracts:").bold().dim());
    for record in records {
        out.push_str(&format!(
            "  {} {}\n",
            checksum(&record.address),
            style(record.integration_label.as_deref().unwrap_or("-")).dim()
        ));
    }
    out.push('\n');
    out
}

fn render_header(state: &StoreState, settings: &Settings) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style(RULE).cyan()));

    let network = match state.chain_id {
        Some(chain_id) => format!("{} ({})", network::chain_name(chain_id), chain_id),
        None => "-".to_string(),
    };
    out.push_str(&format!(
        "{}\n",
        style(format!(" 🔎 VAULT MONITOR | {} | revision {}", network, state.revision))
            .cyan()
            .bold()
    ));

    let fetched = state
        .fetched_at
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    out.push_str(&format!(
        "    fetched: {} | filter: {}\n",
        fetched,
        if settings.show_only_anomalies { "anomalies only" } else { "all vaults" }
    ));
    out.push_str(&format!("{}\n", style(RULE).cyan()));

    if let Some(failure) = &state.last_failure {
        out.push_str(&format!(
            "{} Last refresh for {} failed at {}: {}\n",
            style("✗").red().bold(),
            network::chain_name(failure.chain_id),
            failure.at.format("%H:%M:%S"),
            style(&failure.message).red()
        ));
        out.push_str("  Showing the previous data.\n");
    }
    out.push('\n');
    out
}

fn render_card(card: &VaultCard) -> String {
    let mut out = String::new();

    let name = if card.name.is_empty() { "(unnamed)" } else { card.name.as_str() };
    out.push_str(&format!(
        "{} {}  {}\n",
        style(name).bold(),
        style(format!("(v{})", card.version)).dim(),
        if card.anomalies > 0 {
            style(format!("{} anomalies", card.anomalies)).red().to_string()
        } else {
            style("ok").green().to_string()
        }
    ));
    out.push_str(&format!("  {}\n", card.address));
    out.push_str(&format!("  {}\n", style(&card.icon_url).dim()));

    for section in &card.sections {
        out.push_str(&render_section(section, &card.address));
    }
    out
}

fn render_section(section: &Section, vault_address: &str) -> String {
    let mut out = format!("  {}\n", style(section.category.label()).bold().dim());
    for line in &section.lines {
        out.push_str(&render_line(line, vault_address));
    }
    out
}

fn render_line(line: &StatusLine, vault_address: &str) -> String {
    let (mark, verdict) = if line.valid {
        (style("✓").green(), style("OK").green())
    } else {
        (style("✗").red(), style("KO").red())
    };

    let suffix = if line.valid {
        style(line.suffix.as_str())
    } else {
        style(line.suffix.as_str()).red()
    };

    let mut out = format!("    {} {} {} {}\n", mark, line.prefix, verdict, suffix);
    if let Some(link) = &line.link {
        out.push_str(&format!("      {}\n", style(link).underlined().dim()));
    }

    if !line.valid {
        if let Some(fix) = &line.fix {
            let command = match fix {
                FixTarget::Ledger => {
                    format!("vault-monitor fix {} --category ledger", vault_address)
                }
                FixTarget::Description {
                    strategy_address, ..
                } => format!(
                    "vault-monitor fix {} --category description --strategy {}",
                    vault_address, strategy_address
                ),
            };
            out.push_str(&format!("      ↳ {}\n", style(command).cyan()));
        }
    }
    out
}

/// Remediation panel
pub fn render_fix(payload: &FixPayload) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        style(format!("Fix {} for {} ({})", payload.category, payload.name, payload.address))
            .bold()
    ));
    for instruction in &payload.instructions {
        let body: String = instruction
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.clone(),
                Segment::Link(url) => style(url).underlined().to_string(),
                Segment::Snippet(value) => style(format!("`{}`", value)).yellow().to_string(),
            })
            .collect();
        out.push_str(&format!("  {}. {}\n", instruction.step, body));
    }

    let snippets = payload.snippets();
    if !snippets.is_empty() {
        out.push_str(&format!("\n  {}\n", style("Copyable snippets:").dim()));
        for snippet in snippets {
            out.push_str(&format!("    {}\n", snippet));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::VaultStore;
    use crate::presenter::remediation::ledger_fix;
    use crate::sources::{ApiStrategy, ApiVault, LedgerContract, LedgerSupport, SourceSnapshot};

    fn plain(text: &str) -> String {
        console::strip_ansi_codes(text).to_string()
    }

    fn store_with(chain_id: u64) -> VaultStore {
        let store = VaultStore::new();
        let ticket = store.begin_cycle(chain_id);
        store.publish(
            ticket,
            SourceSnapshot {
                vaults: vec![
                    ApiVault {
                        address: "0xdA816459F1AB5631232FE5e97a05BBBb94970c95".to_string(),
                        name: "DAI yVault".to_string(),
                        version: "0.4.3".to_string(),
                        strategies: vec![ApiStrategy {
                            address: "0x1676055fE954EE6fc388F9096210E5EbE0A9070c".to_string(),
                            name: "StrategyLender".to_string(),
                            description: Some(String::new()),
                            ..Default::default()
                        }],
                        ..Default::default()
                    },
                    ApiVault {
                        address: "0xa354F35829Ae975e850e23e9615b11Da1B3dC4DE".to_string(),
                        name: "Empty".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        );
        store
    }

    #[test]
    fn test_dashboard_lists_anomalies_with_fix_hints() {
        let store = store_with(1);
        let settings = Settings {
            show_only_anomalies: true,
        };
        let out = plain(&render_dashboard(&store.snapshot(), &settings));

        assert!(out.contains("Ethereum (1) | revision 1"));
        assert!(out.contains("DAI yVault"));
        assert!(out.contains("No strategies for this vault:"));
        assert!(out.contains(
            "vault-monitor fix 0xdA816459F1AB5631232FE5e97a05BBBb94970c95 --category ledger"
        ));
        assert!(out.contains("--category description --strategy 0x1676055fE954EE6fc388F9096210E5EbE0A9070c"));
        assert!(out.contains("https://etherscan.io/address/0x1676055fE954EE6fc388F9096210E5EbE0A9070c"));
        assert!(out.contains("Vaults listed: 2"));
    }

    #[test]
    fn test_dashboard_before_first_cycle() {
        let store = VaultStore::new();
        let out = plain(&render_dashboard(&store.snapshot(), &Settings::default()));
        assert!(out.contains("No data loaded yet."));
    }

    #[test]
    fn test_failure_banner() {
        let store = store_with(1);
        let ticket = store.begin_cycle(250);
        store.record_failure(ticket, &eyre::eyre!("risk framework returned malformed JSON"));

        let out = plain(&render_dashboard(&store.snapshot(), &Settings::default()));
        assert!(out.contains("Last refresh for Fantom failed"));
        assert!(out.contains("risk framework returned malformed JSON"));
        assert!(out.contains("DAI yVault"));
    }

    #[test]
    fn test_ledger_only_contracts_listed_when_unfiltered() {
        let store = VaultStore::new();
        let ticket = store.begin_cycle(1);
        store.publish(
            ticket,
            SourceSnapshot {
                ledger: LedgerSupport {
                    contracts: vec![LedgerContract {
                        address: "0x32b8c26d0439e1959cea6262cbabc12320b384c4".to_string(),
                        contract_name: "yvOld".to_string(),
                    }],
                },
                ..Default::default()
            },
        );

        let out = plain(&render_dashboard(&store.snapshot(), &Settings::default()));
        assert!(out.contains("Ledger-only contracts:"));
        assert!(out.contains("0x32b8C26d0439e1959CEa6262CBabC12320b384c4 yvOld"));

        let filtered = Settings {
            show_only_anomalies: true,
        };
        let out = plain(&render_dashboard(&store.snapshot(), &filtered));
        assert!(!out.contains("Ledger-only contracts:"));
        assert!(out.contains("Ledger-only contracts (not in listing): 1"));
    }

    #[test]
    fn test_render_fix_lists_snippets() {
        let out = plain(&render_fix(&ledger_fix(
            "0xdA816459F1AB5631232FE5e97a05BBBb94970c95",
            "DAI yVault",
        )));
        assert!(out.contains("Fix ledger for DAI yVault"));
        assert!(out.contains("4. Clone and rename `_vault_v0.4.3.json` to `0xdA816459F1AB5631232FE5e97a05BBBb94970c95.json`"));
        assert!(out.contains("Copyable snippets:"));
    }
}
