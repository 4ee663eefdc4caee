//! # Torq Exchange Configuration
//!
//! Layered configuration for the exchange core and its tooling.
//!
//! ## Sources
//!
//! - **Defaults**: compiled in, see [`defaults`]
//! - **File**: optional TOML with `[router]`, `[logging]` and `[market]` sections
//! - **Environment**: `TORQ_` prefix, `__` between section and key
//!
//! ## Usage
//!
//! ```rust
//! use torq_config::load_config;
//!
//! let config = load_config(None).unwrap();
//! assert_eq!(config.router.native_decimals, 18);
//! ```

pub mod defaults;
pub mod engine_config;

pub use engine_config::{load_config, EngineConfig, LoggingSettings, MarketSettings, RouterSettings};
