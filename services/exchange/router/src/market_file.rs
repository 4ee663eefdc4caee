//! Pool snapshot files for offline quoting
//!
//! ```toml
//! [[tokens]]
//! symbol = "USDC"
//! address = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"
//! decimals = 6
//!
//! [[pools]]
//! token_a = "USDC"
//! token_b = "WETH"
//! reserve_a = "2000000"
//! reserve_b = "1000.5"
//! ```
//!
//! Reserves are human-readable decimal strings scaled by each token's
//! `decimals`. Tokens may be referenced by symbol or by hex address.

use anyhow::{bail, Context, Result};
use exchange_state::{PairRegistry, ReserveStore};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use types::precision::parse_amount;
use types::{Reserves, Token, TokenAddress};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketFile {
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub pools: Vec<PoolEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    pub token_a: String,
    pub token_b: String,
    pub reserve_a: String,
    pub reserve_b: String,
}

impl MarketFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pool file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid pool file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve a token by symbol (case-insensitive) or hex address
    pub fn token(&self, reference: &str) -> Result<&Token> {
        if let Some(token) = self
            .tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(reference))
        {
            return Ok(token);
        }
        if let Ok(address) = TokenAddress::from_hex(reference) {
            if let Some(token) = self.tokens.iter().find(|token| token.address == address) {
                return Ok(token);
            }
        }
        bail!("Unknown token '{}'", reference)
    }

    /// Resolve a comma- or arrow-separated path such as `USDC,WETH,DAI`
    pub fn path(&self, spec: &str) -> Result<Vec<&Token>> {
        spec.split([',', '>'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| self.token(part))
            .collect()
    }

    /// Make the wrapped-native token resolvable under the native symbol
    ///
    /// A snapshot that already lists the wrapped token keeps its own entry.
    pub fn with_native(mut self, wrapped: TokenAddress, symbol: &str, decimals: u8) -> Self {
        if !self.tokens.iter().any(|token| token.address == wrapped) {
            self.tokens.push(Token::new(wrapped, symbol, decimals));
        }
        self
    }

    /// Register every pool and set its reserves; returns the pool count
    pub fn install(&self, registry: &PairRegistry, reserves: &ReserveStore) -> Result<usize> {
        for (index, pool) in self.pools.iter().enumerate() {
            let token_a = self.token(&pool.token_a)?;
            let token_b = self.token(&pool.token_b)?;
            let reserve_a = parse_amount(&pool.reserve_a, token_a.decimals)
                .with_context(|| format!("pools[{}].reserve_a", index))?;
            let reserve_b = parse_amount(&pool.reserve_b, token_b.decimals)
                .with_context(|| format!("pools[{}].reserve_b", index))?;

            let pair = registry
                .get_or_create(reserves, token_a.address, token_b.address)
                .with_context(|| format!("pools[{}]", index))?;
            let canonical = if pair.key.is_token0(token_a.address) {
                Reserves::new(reserve_a, reserve_b)
            } else {
                Reserves::new(reserve_b, reserve_a)
            };
            reserves.set_reserves(pair.address, canonical);
        }

        info!(
            "Loaded {} pools over {} tokens",
            self.pools.len(),
            self.tokens.len()
        );
        Ok(self.pools.len())
    }
}
