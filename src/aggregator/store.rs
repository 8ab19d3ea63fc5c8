//! Vault Store
//!
//! Single writer, many readers. Every update builds a new `StoreState` and
//! swaps it into a `watch` channel, so a reader always holds one consistent
//! snapshot (listing, risk framework, view and revision together).
//!
//! Fetch cycles are tagged with an epoch. Only the most recently issued cycle
//! may publish; anything older that settles later is dropped.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::merge::aggregate;
use super::record::{checksum, AggregatedView, IconReport};
use super::risk_groups;
use crate::sources::{ApiVault, RiskFrameworkEntry, SourceSnapshot};

/// A fetch cycle that failed after the last successful one
#[derive(Debug, Clone, PartialEq)]
pub struct CycleFailure {
    pub chain_id: u64,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Bumped once per published fetch cycle
    pub revision: u64,
    /// Network of the published view, `None` before the first cycle
    pub chain_id: Option<u64>,
    pub listing: Arc<Vec<ApiVault>>,
    /// Risk framework entries for `chain_id`
    pub risk_framework: Arc<Vec<RiskFrameworkEntry>>,
    pub view: Arc<AggregatedView>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_failure: Option<CycleFailure>,
}

/// Handle for one in-flight fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    pub epoch: u64,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The cycle's result is now visible under this revision
    Applied { revision: u64 },
    /// A newer cycle was issued; the result was dropped
    Superseded,
    /// Failure recorded, previous view kept
    Failed,
}

pub struct VaultStore {
    tx: watch::Sender<Arc<StoreState>>,
    epoch: AtomicU64,
}

impl VaultStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(StoreState::default()));
        Self {
            tx,
            epoch: AtomicU64::new(0),
        }
    }

    /// Receiver notified on every change (publish, failure, icon patch)
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreState>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Arc<StoreState> {
        self.tx.borrow().clone()
    }

    /// Start a new cycle. Every previously issued ticket becomes stale.
    pub fn begin_cycle(&self, chain_id: u64) -> CycleTicket {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Cycle {} issued for chain {}", epoch, chain_id);
        CycleTicket { epoch, chain_id }
    }

    pub fn is_current(&self, ticket: &CycleTicket) -> bool {
        self.epoch.load(Ordering::SeqCst) == ticket.epoch
    }

    /// Aggregate and publish a snapshot, unless the ticket is stale
    pub fn publish(&self, ticket: CycleTicket, snapshot: SourceSnapshot) -> PublishOutcome {
        if !self.is_current(&ticket) {
            debug!("Dropping result of stale cycle {} (chain {})", ticket.epoch, ticket.chain_id);
            return PublishOutcome::Superseded;
        }

        let view = aggregate(&snapshot, ticket.chain_id);
        let risk_framework = risk_groups::for_network(&snapshot.risk_framework, ticket.chain_id);
        let listing = snapshot.vaults;

        let mut outcome = PublishOutcome::Superseded;
        self.tx.send_if_modified(|state| {
            // Re-checked under the channel lock: a newer ticket may have been
            // issued while we were aggregating
            if !self.is_current(&ticket) {
                return false;
            }
            let revision = state.revision + 1;
            *state = Arc::new(StoreState {
                revision,
                chain_id: Some(ticket.chain_id),
                listing: Arc::new(listing),
                risk_framework: Arc::new(risk_framework),
                view: Arc::new(view),
                fetched_at: Some(Utc::now()),
                last_failure: None,
            });
            outcome = PublishOutcome::Applied { revision };
            true
        });

        match outcome {
            PublishOutcome::Applied { revision } => {
                info!("Published revision {} for chain {}", revision, ticket.chain_id)
            }
            _ => debug!("Dropping result of stale cycle {}", ticket.epoch),
        }
        outcome
    }

    /// Record a failed cycle. The published view is left as it was.
    pub fn record_failure(&self, ticket: CycleTicket, error: &eyre::Report) -> PublishOutcome {
        let mut outcome = PublishOutcome::Superseded;
        self.tx.send_if_modified(|state| {
            if !self.is_current(&ticket) {
                return false;
            }
            let mut next = StoreState::clone(state);
            next.last_failure = Some(CycleFailure {
                chain_id: ticket.chain_id,
                message: format!("{:#}", error),
                at: Utc::now(),
            });
            *state = Arc::new(next);
            outcome = PublishOutcome::Failed;
            true
        });

        if outcome == PublishOutcome::Failed {
            warn!("Fetch cycle for chain {} failed: {:#}", ticket.chain_id, error);
        }
        outcome
    }

    /// Patch one icon flag. Reports for another revision or an unknown
    /// address are ignored; repeating a report is harmless.
    pub fn apply_icon_report(&self, report: IconReport) -> bool {
        self.tx.send_if_modified(|state| {
            if state.revision != report.revision {
                debug!(
                    "Ignoring {} report for {} from revision {} (current {})",
                    report.kind,
                    checksum(&report.address),
                    report.revision,
                    state.revision
                );
                return false;
            }
            let Some(view) = state
                .view
                .with_icon_status(&report.address, report.kind, report.success)
            else {
                return false;
            };

            let mut next = StoreState::clone(state);
            next.view = Arc::new(view);
            *state = Arc::new(next);
            true
        })
    }
}

impl Default for VaultStore {
    fn default() -> Self {
        Self::new()
    }
}
