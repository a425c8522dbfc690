use alloy::primitives::Address;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{execution::ExecutionMode, venue::Venue};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket JSON-RPC endpoint of the node.
    pub rpc_url: String,

    /// Token the strategy accumulates (the base leg of every round trip).
    pub arb_for: Address,

    /// Token traded against (the quote leg).
    pub arb_against: Address,

    /// Fractional digits prices are rounded to before comparison and display.
    pub units: u32,

    /// Divergence threshold, in percent, that opens a detection cycle.
    pub price_difference: f64,

    /// Fee buffer applied to the profitability decision, in basis points.
    #[serde(default = "default_fee_buffer_bps")]
    pub fee_buffer_bps: u64,

    /// Gas limit assumed for the settlement transaction.
    pub gas_limit: u64,

    /// Gas price in wei assumed for the settlement transaction.
    pub gas_price: u128,

    /// Whether profitable trades are submitted on-chain or only reported.
    pub execution_mode: ExecutionMode,

    /// Address of the deployed settlement contract.
    pub arbitrage_address: Address,

    /// The two monitored venues, in (A, B) order.
    pub venues: [Venue; 2],
}

fn default_fee_buffer_bps() -> u64 {
    100
}

impl Config {
    /// Load configuration from environment and optional config file.
    ///
    /// The signing key is deliberately not part of the config file; it is
    /// read from `TAKA_PRIVATE_KEY` by the component that needs it.
    pub fn load() -> Result<Self, figment::Error> {
        let config: Config = Figment::new()
            .merge(Yaml::file("taka.yaml"))
            .merge(Env::prefixed("TAKA_"))
            .extract()?;

        Ok(config)
    }
}
