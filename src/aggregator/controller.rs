//! Reload Controller
//!
//! Owns the active network key. Changing the key triggers a fetch cycle;
//! `refresh` re-runs a cycle for the current key.

use eyre::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::store::{CycleTicket, PublishOutcome, VaultStore};
use crate::network;
use crate::sources::SnapshotSource;

/// No network selected yet
const UNSET_CHAIN: u64 = 0;

pub struct ReloadController<S> {
    source: S,
    store: Arc<VaultStore>,
    /// Held while a cycle is issued, so the key and the store epoch move together
    chain_id: Mutex<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Published(PublishOutcome),
    /// The requested network is already active
    Unchanged,
}

impl<S: SnapshotSource> ReloadController<S> {
    pub fn new(source: S, store: Arc<VaultStore>) -> Self {
        Self {
            source,
            store,
            chain_id: Mutex::new(UNSET_CHAIN),
        }
    }

    pub fn store(&self) -> &Arc<VaultStore> {
        &self.store
    }

    fn selected(&self) -> MutexGuard<'_, u64> {
        self.chain_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Currently selected network, if any
    pub fn chain_id(&self) -> Option<u64> {
        match *self.selected() {
            UNSET_CHAIN => None,
            chain_id => Some(chain_id),
        }
    }

    /// Switch network. Reloads unless the key is unchanged and the store
    /// already shows that network; a failed switch can be retried.
    pub async fn select_chain(&self, chain_id: u64) -> Result<ReloadOutcome> {
        let (previous, ticket) = {
            let mut selected = self.selected();
            if *selected == chain_id && self.store.snapshot().chain_id == Some(chain_id) {
                debug!("Chain {} already selected", chain_id);
                return Ok(ReloadOutcome::Unchanged);
            }
            let previous = std::mem::replace(&mut *selected, chain_id);
            (previous, self.store.begin_cycle(chain_id))
        };

        if previous != UNSET_CHAIN && previous != chain_id {
            info!(
                "Network changed: {} → {}",
                network::chain_name(previous),
                network::chain_name(chain_id)
            );
        }
        self.reload(ticket).await.map(ReloadOutcome::Published)
    }

    /// Re-run a cycle for the selected network (mainnet when none is selected)
    pub async fn refresh(&self) -> Result<PublishOutcome> {
        let ticket = {
            let mut selected = self.selected();
            if *selected == UNSET_CHAIN {
                *selected = network::PRIMARY_CHAIN_ID;
            }
            self.store.begin_cycle(*selected)
        };
        self.reload(ticket).await
    }

    /// One fetch cycle. A failure of the current cycle is recorded in the
    /// store and returned; a failure of a superseded cycle is swallowed.
    async fn reload(&self, ticket: CycleTicket) -> Result<PublishOutcome> {
        match self.source.fetch_snapshot(ticket.chain_id).await {
            Ok(snapshot) => Ok(self.store.publish(ticket, snapshot)),
            Err(error) => match self.store.record_failure(ticket, &error) {
                PublishOutcome::Superseded => {
                    debug!("Stale cycle {} failed: {:#}", ticket.epoch, error);
                    Ok(PublishOutcome::Superseded)
                }
                _ => Err(error),
            },
        }
    }
}
