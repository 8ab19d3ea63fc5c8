//! Vault Monitor - yearn vault metadata anomaly detection
//!
//! Run with: cargo run -- scan --chain 1
//!
//! Pulls the vault listing, the Ledger plugin registry and the risk
//! framework for one network, merges them per vault address and reports
//! every vault whose metadata is incomplete.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aggregator;
mod cli;
mod config;
mod network;
mod presenter;
mod probe;
mod sources;

use aggregator::{checksum, normalize_address, IconReport, ReloadController, StoreState, VaultStore};
use cli::{parse_watch_input, Cli, Command, FixKind, WatchInput, WATCH_HELP};
use config::Config;
use presenter::{
    description_fix, ledger_fix, render_dashboard, render_fix, FixCategory, FixPanel, Report,
    Settings,
};
use probe::{icon_targets, IconProber, IconReporter};
use sources::SourceFetcher;

type Controller = ReloadController<SourceFetcher>;

/// Minimum time between two redraws in watch mode
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 🔎 VAULT MONITOR - yearn metadata anomaly detection").cyan().bold()
    );
    println!(
        "{}",
        style("    Icons | Ledger Live | Strategies | Risk | Descriptions").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so that `scan --json` keeps stdout clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("vault_monitor={}", level).parse()?),
        )
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load config file {}", path.display()))?,
        None => Config::from_env()?,
    };

    if let Some(chain_id) = cli.chain {
        config.chain_id = chain_id;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file or --config");
        return Err(e);
    }

    if !network::KNOWN_CHAIN_IDS.contains(&config.chain_id) {
        warn!(
            "Chain {} is not a known yearn network, explorer links fall back to etherscan",
            config.chain_id
        );
    }
    Ok(config)
}

fn spinner(message: String) -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let config = load_config(&cli)?;
    let command = cli.command.unwrap_or(Command::Scan {
        only_anomalies: false,
        json: false,
        no_probe: false,
    });

    if let Command::Config = command {
        config.print_summary();
        return Ok(());
    }

    let store = Arc::new(VaultStore::new());
    let controller = Arc::new(ReloadController::new(
        SourceFetcher::new(&config)?,
        Arc::clone(&store),
    ));

    match command {
        Command::Scan {
            only_anomalies,
            json,
            no_probe,
        } => {
            if !json {
                print_banner();
            }
            let settings = Settings {
                show_only_anomalies: config.show_only_anomalies || only_anomalies,
            };
            let prober = (!no_probe)
                .then(|| IconProber::new(config.request_timeout_secs, config.probe_concurrency))
                .transpose()?;
            run_scan(&config, &controller, prober.as_ref(), settings, json).await
        }
        Command::Watch {
            only_anomalies,
            interval,
            no_probe,
        } => {
            let settings = Settings {
                show_only_anomalies: config.show_only_anomalies || only_anomalies,
            };
            let prober = (!no_probe)
                .then(|| IconProber::new(config.request_timeout_secs, config.probe_concurrency))
                .transpose()?
                .map(Arc::new);
            let interval_secs = interval.unwrap_or(config.refresh_interval_secs).max(1);
            run_watch(&config, controller, prober, settings, interval_secs).await
        }
        Command::Fix {
            vault,
            category,
            strategy,
        } => run_fix(&config, &controller, &vault, category, strategy.as_deref()).await,
        Command::Config => Ok(()),
    }
}

// =============================================
// SCAN
// =============================================

async fn run_scan(
    config: &Config,
    controller: &Controller,
    prober: Option<&IconProber>,
    settings: Settings,
    json: bool,
) -> Result<()> {
    let chain_id = config.chain_id;
    let store = controller.store();

    let bar = spinner(format!(
        "Fetching vaults for {} ({})...",
        network::chain_name(chain_id),
        chain_id
    ))?;
    let outcome = controller.select_chain(chain_id).await;
    bar.finish_and_clear();
    let outcome = outcome.wrap_err_with(|| format!("Failed to load vaults for chain {}", chain_id))?;
    debug!("Fetch cycle outcome: {:?}", outcome);

    let state = store.snapshot();
    debug!("Aggregated {} records", state.view.len());
    if state.view.is_empty() {
        warn!("No vaults returned for chain {}", chain_id);
    }
    if !json {
        println!(
            "{} Loaded {} vaults ({} Ledger-only contracts)",
            style("✓").green(),
            state.view.listed().count(),
            state.view.integration_only().count()
        );
    }

    if let Some(prober) = prober {
        let bar = spinner("Probing vault and token icons...".to_string())?;
        let broken = probe_icons(prober, store, &state).await;
        bar.finish_and_clear();
        if !json {
            println!("{} Icon probes done, {} broken", style("✓").green(), broken);
        }
    }

    let state = store.snapshot();
    if json {
        println!("{}", Report::build(&state, &settings).to_json()?);
    } else {
        println!();
        print!("{}", render_dashboard(&state, &settings));
    }
    Ok(())
}

/// Probe every icon of a published state and apply the reports
async fn probe_icons(prober: &IconProber, store: &VaultStore, state: &StoreState) -> usize {
    let Some(chain_id) = state.chain_id else {
        return 0;
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let targets = icon_targets(&state.view, chain_id);
    let broken = prober
        .probe(targets, IconReporter::new(state.revision, tx))
        .await;

    while let Ok(report) = rx.try_recv() {
        store.apply_icon_report(report);
    }
    broken
}

// =============================================
// WATCH
// =============================================

/// Run one fetch cycle in the background. Failures land in the store.
fn spawn_cycle(controller: &Arc<Controller>, chain_id: Option<u64>) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let result = match chain_id {
            Some(chain_id) => controller.select_chain(chain_id).await.map(|_| ()),
            None => controller.refresh().await.map(|_| ()),
        };
        if let Err(e) = result {
            warn!("Refresh failed: {:#}", e);
        }
    });
}

fn spawn_probe(prober: &Arc<IconProber>, state: &StoreState, tx: &mpsc::UnboundedSender<IconReport>) {
    let Some(chain_id) = state.chain_id else {
        return;
    };
    let prober = Arc::clone(prober);
    let targets = icon_targets(&state.view, chain_id);
    let reporter = IconReporter::new(state.revision, tx.clone());
    tokio::spawn(async move {
        prober.probe(targets, reporter).await;
    });
}

fn redraw(term: &Term, state: &StoreState, settings: &Settings) -> Result<()> {
    term.clear_screen()?;
    print!("{}", render_dashboard(state, settings));
    println!();
    println!("{}", style(WATCH_HELP).dim());
    Ok(())
}

async fn run_watch(
    config: &Config,
    controller: Arc<Controller>,
    prober: Option<Arc<IconProber>>,
    mut settings: Settings,
    interval_secs: u64,
) -> Result<()> {
    let store = Arc::clone(controller.store());
    let term = Term::stdout();
    let mut state_rx = store.subscribe();
    let (report_tx, mut report_rx) = mpsc::unbounded_channel();

    let mut refresh = tokio::time::interval(Duration::from_secs(interval_secs));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial cycle covers it
    refresh.tick().await;

    let mut redraw_tick = tokio::time::interval(REDRAW_INTERVAL);
    let mut dirty = true;
    let mut probed_revision = 0;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!(
        "Watching {} every {}s",
        network::chain_name(config.chain_id),
        interval_secs
    );
    spawn_cycle(&controller, Some(config.chain_id));

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                debug!("Periodic refresh");
                spawn_cycle(&controller, None);
            }
            Some(report) = report_rx.recv() => {
                store.apply_icon_report(report);
                while let Ok(report) = report_rx.try_recv() {
                    store.apply_icon_report(report);
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = Arc::clone(&state_rx.borrow_and_update());
                if state.revision != probed_revision && state.chain_id.is_some() {
                    probed_revision = state.revision;
                    if let Some(prober) = &prober {
                        spawn_probe(prober, &state, &report_tx);
                    }
                }
                dirty = true;
            }
            _ = redraw_tick.tick(), if dirty => {
                redraw(&term, &store.snapshot(), &settings)?;
                dirty = false;
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match parse_watch_input(&line) {
                        WatchInput::SwitchChain(chain_id) => {
                            if controller.store().snapshot().chain_id != Some(chain_id) {
                                println!("Switching to {} ({})...", network::chain_name(chain_id), chain_id);
                            }
                            spawn_cycle(&controller, Some(chain_id));
                        }
                        WatchInput::ToggleAnomalies => {
                            settings.toggle_anomalies();
                            dirty = true;
                        }
                        WatchInput::Refresh => {
                            let chain_id = controller.chain_id().unwrap_or(network::PRIMARY_CHAIN_ID);
                            println!("Refreshing {}...", network::chain_name(chain_id));
                            spawn_cycle(&controller, None);
                        }
                        WatchInput::Quit => break,
                        WatchInput::Unknown(input) => {
                            println!("Unknown command {:?}. {}", input, WATCH_HELP);
                        }
                    },
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("{}", style("Stopped.").dim());
    Ok(())
}

// =============================================
// FIX
// =============================================

/// Show the panel's payload, then close it
fn show_panel(panel: &mut FixPanel) {
    if let Some(payload) = panel.payload() {
        println!("{}", render_fix(payload));
    }
    panel.close();
}

async fn run_fix(
    config: &Config,
    controller: &Controller,
    vault: &str,
    kind: FixKind,
    strategy: Option<&str>,
) -> Result<()> {
    let chain_id = config.chain_id;
    let address = normalize_address(vault).ok_or_else(|| eyre!("Invalid vault address: {}", vault))?;

    controller
        .select_chain(chain_id)
        .await
        .wrap_err_with(|| format!("Failed to load vaults for chain {}", chain_id))?;

    let state = controller.store().snapshot();
    let record = state.view.get(&address).ok_or_else(|| {
        eyre!(
            "Vault {} not found on {}",
            checksum(&address),
            network::chain_name(chain_id)
        )
    })?;
    let vault_address = checksum(&record.address);
    let mut panel = FixPanel::default();

    match FixCategory::from(kind) {
        FixCategory::Ledger => {
            if record.has_ledger_integration {
                println!("{} {} already has a Ledger integration", style("✓").green(), vault_address);
                return Ok(());
            }
            panel.open(ledger_fix(&vault_address, &record.name));
            show_panel(&mut panel);
        }
        FixCategory::Description => {
            let strategies = match strategy {
                Some(raw) => {
                    let strategy_address = normalize_address(raw)
                        .ok_or_else(|| eyre!("Invalid strategy address: {}", raw))?;
                    let strategy = record.strategy(&strategy_address).ok_or_else(|| {
                        eyre!(
                            "Strategy {} is not attached to vault {}",
                            checksum(&strategy_address),
                            vault_address
                        )
                    })?;
                    vec![strategy]
                }
                None => record
                    .strategies
                    .iter()
                    .filter(|strategy| !strategy.has_description())
                    .collect(),
            };

            if strategies.is_empty() {
                println!("{} Every strategy of {} has a description", style("✓").green(), vault_address);
            }
            for strategy in strategies {
                panel.open(description_fix(
                    chain_id,
                    &vault_address,
                    &record.name,
                    &strategy.name,
                    &strategy.display_address(),
                ));
                show_panel(&mut panel);
            }
        }
    }
    Ok(())
}
