//! Engine Configuration Module
//!
//! Provides configuration loading for the exchange engine and its tooling.
//! Layers, lowest priority first: compiled-in defaults, an optional TOML
//! file, then `TORQ_`-prefixed environment variables
//! (`TORQ_ROUTER__WRAPPED_NATIVE=0x...`).

use crate::defaults;
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use types::{Address, TokenAddress};

/// Main engine configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Swap engine and liquidity manager settings
    pub router: RouterSettings,

    /// Logging settings for binaries
    pub logging: LoggingSettings,

    /// Offline market data for tooling
    #[serde(default)]
    pub market: MarketSettings,
}

/// Router settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RouterSettings {
    /// The engine's own account; receives native-out proceeds before forwarding
    pub engine_address: Address,

    /// Token that wraps the native asset; native-in paths start with it
    pub wrapped_native: TokenAddress,

    /// Symbol and decimals tooling uses for the wrapped-native token
    /// when a pool snapshot does not list it
    pub native_symbol: String,
    pub native_decimals: u8,

    /// Deadline window tooling applies when the caller gives none
    pub default_deadline_secs: u64,
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingSettings {
    /// `tracing` filter directive (`info`, `torq_router=debug`, ...)
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Market data settings
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct MarketSettings {
    /// Pool snapshot file; `$VAR` and `~` are expanded
    pub pools_file: Option<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            engine_address: Address::from_hex(defaults::router::ENGINE_ADDRESS)
                .unwrap_or(Address::ZERO),
            wrapped_native: TokenAddress::from_hex(defaults::router::WRAPPED_NATIVE)
                .unwrap_or(TokenAddress::ZERO),
            native_symbol: defaults::router::NATIVE_SYMBOL.to_string(),
            native_decimals: defaults::router::NATIVE_DECIMALS,
            default_deadline_secs: defaults::router::DEFAULT_DEADLINE_SECS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            json: false,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            router: RouterSettings::default(),
            logging: LoggingSettings::default(),
            market: MarketSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = toml::to_string(&EngineConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        if let Some(path) = path {
            info!("Loading engine config: {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        // Override with environment variables (TORQ_ prefix, __ between sections)
        builder = builder.add_source(
            Environment::with_prefix("TORQ")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut engine: EngineConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        engine.expand_env_vars()?;
        engine.validate()?;

        debug!(
            "Engine config: engine={} wrapped_native={} log_level={}",
            engine.router.engine_address, engine.router.wrapped_native, engine.logging.level
        );
        Ok(engine)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.router.engine_address.is_zero() {
            anyhow::bail!("router.engine_address must not be the zero address");
        }
        if self.router.wrapped_native.is_zero() {
            anyhow::bail!("router.wrapped_native must not be the zero address");
        }
        Ok(())
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(pools_file) = &self.market.pools_file {
            let expanded = shellexpand::full(pools_file).context("Failed to expand pools file path")?;
            self.market.pools_file = Some(expanded.to_string());
        }
        Ok(())
    }

    /// Pool snapshot path, if configured
    pub fn pools_file(&self) -> Option<PathBuf> {
        self.market.pools_file.as_ref().map(PathBuf::from)
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    EngineConfig::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let config = EngineConfig::load(None).unwrap();

        assert_eq!(config.router, RouterSettings::default());
        assert_eq!(config.router.native_decimals, 18);
        assert!(!config.router.wrapped_native.is_zero());
        assert_eq!(config.logging.level, "info");
        assert!(config.market.pools_file.is_none());
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("engine.toml");

        let config_content = r#"
[router]
wrapped_native = "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"
native_symbol = "MATIC"

[logging]
level = "debug"
json = true

[market]
pools_file = "/tmp/pools.toml"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = EngineConfig::load(Some(&config_path)).unwrap();

        assert_eq!(
            config.router.wrapped_native,
            TokenAddress::from_hex("0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270").unwrap()
        );
        assert_eq!(config.router.native_symbol, "MATIC");
        // Untouched keys keep their defaults
        assert_eq!(config.router.default_deadline_secs, 1_200);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.pools_file(), Some(PathBuf::from("/tmp/pools.toml")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(EngineConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_zero_wrapped_native_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("engine.toml");
        fs::write(
            &config_path,
            "[router]\nwrapped_native = \"0x0000000000000000000000000000000000000000\"\n",
        )
        .unwrap();

        let err = EngineConfig::load(Some(&config_path)).unwrap_err();
        assert!(err.to_string().contains("wrapped_native"));
    }
}
