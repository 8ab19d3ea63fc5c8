//! The Aggregator
//!
//! Responsible for:
//! - Merging the three sources into one record per vault address
//! - Computing the anomaly flags
//! - Publishing the result through a single-writer store

mod controller;
mod merge;
mod record;
mod risk_groups;
mod store;

pub use controller::{ReloadController, ReloadOutcome};
pub use merge::aggregate;
pub use record::{checksum, normalize_address, AggregatedView, IconKind, IconReport, VaultRecord};
pub use store::{CycleFailure, StoreState, VaultStore};
