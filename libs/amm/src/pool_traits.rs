//! Reserve access seam between the pricing engine and whatever stores reserves

use std::collections::HashMap;
use types::{ExchangeResult, LiquidityError, PairKey, Reserves, TokenAddress};

/// Read-only view of current pair reserves
///
/// Implementations resolve the pair for `(token_a, token_b)` and return its
/// reserves ordered as the arguments. A missing pair is a
/// [`LiquidityError::PairNotFound`].
pub trait ReserveSource {
    fn get_reserves(&self, token_a: TokenAddress, token_b: TokenAddress) -> ExchangeResult<(u128, u128)>;
}

impl<T: ReserveSource + ?Sized> ReserveSource for &T {
    fn get_reserves(&self, token_a: TokenAddress, token_b: TokenAddress) -> ExchangeResult<(u128, u128)> {
        (**self).get_reserves(token_a, token_b)
    }
}

/// Static reserve table, for offline quoting and tests
impl ReserveSource for HashMap<PairKey, Reserves> {
    fn get_reserves(&self, token_a: TokenAddress, token_b: TokenAddress) -> ExchangeResult<(u128, u128)> {
        let key = PairKey::new(token_a, token_b)?;
        let reserves = self
            .get(&key)
            .ok_or(LiquidityError::PairNotFound { token_a, token_b })?;
        Ok(reserves.oriented(&key, token_a))
    }
}
