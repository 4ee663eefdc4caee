//! Read-only market view used by the pricing engine

use crate::registry::PairRegistry;
use crate::reserve_store::ReserveStore;
use amm::ReserveSource;
use types::{ExchangeResult, LiquidityError, PairKey, PairRecord, Reserves, TokenAddress};

/// Registry plus reserve store, borrowed for the duration of one call
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub registry: &'a PairRegistry,
    pub reserves: &'a ReserveStore,
}

impl<'a> MarketView<'a> {
    pub fn new(registry: &'a PairRegistry, reserves: &'a ReserveStore) -> Self {
        Self { registry, reserves }
    }

    /// Existing pair for `(token_a, token_b)` or [`LiquidityError::PairNotFound`]
    pub fn pair(&self, token_a: TokenAddress, token_b: TokenAddress) -> ExchangeResult<PairRecord> {
        let key = PairKey::new(token_a, token_b)?;
        Ok(self
            .registry
            .get_by_key(&key)
            .ok_or(LiquidityError::PairNotFound { token_a, token_b })?)
    }

    /// Pair for every hop of `path`, in path order
    pub fn path_pairs(&self, path: &[TokenAddress]) -> ExchangeResult<Vec<PairRecord>> {
        amm::validate_path(path)?;
        path.windows(2).map(|hop| self.pair(hop[0], hop[1])).collect()
    }

    pub fn pair_reserves(&self, pair: &PairRecord) -> Reserves {
        self.reserves.reserves(pair.address)
    }
}

impl ReserveSource for MarketView<'_> {
    fn get_reserves(&self, token_a: TokenAddress, token_b: TokenAddress) -> ExchangeResult<(u128, u128)> {
        let pair = self.pair(token_a, token_b)?;
        Ok(self.pair_reserves(&pair).oriented(&pair.key, token_a))
    }
}
