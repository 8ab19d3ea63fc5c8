//! Data Ingest
//!
//! The three remote JSON sources and their wire types.

mod fetcher;
mod types;

pub use fetcher::{SnapshotSource, SourceFetcher};
pub use types::{
    ApiStrategy, ApiToken, ApiVault, LedgerContract, LedgerSupport, RiskCriteria,
    RiskFrameworkEntry, RiskScores, SourceSnapshot,
};
