//! Default configuration values
//!
//! Compiled-in defaults used when no file or environment override is given.

/// Router defaults
pub mod router {
    /// Engine account (canonical Uniswap V2 Router02 deployment)
    pub const ENGINE_ADDRESS: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";

    /// Wrapped native token (mainnet WETH9)
    pub const WRAPPED_NATIVE: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    /// Native asset display symbol
    pub const NATIVE_SYMBOL: &str = "ETH";

    /// Native asset decimals
    pub const NATIVE_DECIMALS: u8 = 18;

    /// Deadline window applied by tooling when a request has none (seconds)
    pub const DEFAULT_DEADLINE_SECS: u64 = 1_200;
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
}
