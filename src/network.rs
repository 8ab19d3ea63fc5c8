//! Network (chain id) helpers
//!
//! Explorer links and display names for the networks the yearn API serves.

/// Ethereum mainnet. The Ledger Live plugin only exists here.
pub const PRIMARY_CHAIN_ID: u64 = 1;

pub const OPTIMISM_CHAIN_ID: u64 = 10;
pub const FANTOM_CHAIN_ID: u64 = 250;
pub const ARBITRUM_CHAIN_ID: u64 = 42161;

/// Networks the vault API is known to serve
pub const KNOWN_CHAIN_IDS: [u64; 4] = [
    PRIMARY_CHAIN_ID,
    OPTIMISM_CHAIN_ID,
    FANTOM_CHAIN_ID,
    ARBITRUM_CHAIN_ID,
];

/// Block explorer used for strategy address links
pub fn explorer_url(chain_id: u64) -> &'static str {
    match chain_id {
        FANTOM_CHAIN_ID => "https://ftmscan.com",
        ARBITRUM_CHAIN_ID => "https://arbiscan.io",
        _ => "https://etherscan.io",
    }
}

/// `<explorer>/address/<address>`
pub fn explorer_address_link(chain_id: u64, address: &str) -> String {
    format!("{}/address/{}", explorer_url(chain_id), address)
}

pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        PRIMARY_CHAIN_ID => "Ethereum",
        OPTIMISM_CHAIN_ID => "Optimism",
        FANTOM_CHAIN_ID => "Fantom",
        ARBITRUM_CHAIN_ID => "Arbitrum",
        _ => "Unknown",
    }
}

/// Whether the Ledger integration is checked against the registry on this network.
/// Everywhere else the integration is considered out of scope and passes by default.
pub fn requires_ledger_integration(chain_id: u64) -> bool {
    chain_id == PRIMARY_CHAIN_ID
}
