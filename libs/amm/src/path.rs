//! Multi-hop path quoting
//!
//! Every hop's reserves are read once, before any arithmetic, so a quote is a
//! single consistent snapshot even if the source changes while it runs.

use crate::pool_traits::ReserveSource;
use crate::v2_math::V2Math;
use tracing::trace;
use types::{ExchangeResult, TokenAddress, ValidationError};

/// Check the structural rules every path obeys: at least two tokens, no
/// token repeated in consecutive positions
pub fn validate_path(path: &[TokenAddress]) -> ExchangeResult<()> {
    if path.len() < 2 {
        return Err(ValidationError::PathTooShort { len: path.len() }.into());
    }
    if let Some(hop) = path.windows(2).find(|hop| hop[0] == hop[1]) {
        return Err(ValidationError::RepeatedToken { token: hop[0] }.into());
    }
    Ok(())
}

/// Reserves `(reserve_in, reserve_out)` for every hop, read up front
pub fn hop_reserves<S: ReserveSource>(source: &S, path: &[TokenAddress]) -> ExchangeResult<Vec<(u128, u128)>> {
    validate_path(path)?;
    path.windows(2)
        .map(|hop| source.get_reserves(hop[0], hop[1]))
        .collect()
}

/// Output amounts along `path` for an exact input
///
/// `amounts[0] == amount_in` and `amounts[i + 1]` is what hop `i` pays out.
pub fn get_amounts_out<S: ReserveSource>(
    source: &S,
    amount_in: u128,
    path: &[TokenAddress],
) -> ExchangeResult<Vec<u128>> {
    let reserves = hop_reserves(source, path)?;
    amounts_out_with_reserves(amount_in, &reserves)
}

/// Input amounts along `path` for an exact output
///
/// `amounts[last] == amount_out` and `amounts[0]` is the required input.
pub fn get_amounts_in<S: ReserveSource>(
    source: &S,
    amount_out: u128,
    path: &[TokenAddress],
) -> ExchangeResult<Vec<u128>> {
    let reserves = hop_reserves(source, path)?;
    amounts_in_with_reserves(amount_out, &reserves)
}

/// Forward walk over pre-read hop reserves
pub fn amounts_out_with_reserves(amount_in: u128, reserves: &[(u128, u128)]) -> ExchangeResult<Vec<u128>> {
    if amount_in == 0 {
        return Err(ValidationError::ZeroAmount { what: "input amount" }.into());
    }

    let mut amounts = Vec::with_capacity(reserves.len() + 1);
    amounts.push(amount_in);
    for (hop, &(reserve_in, reserve_out)) in reserves.iter().enumerate() {
        let amount_out = V2Math::get_amount_out(amounts[hop], reserve_in, reserve_out)?;
        trace!(hop, reserve_in, reserve_out, amount_out, "quoted hop");
        amounts.push(amount_out);
    }
    Ok(amounts)
}

/// Backward walk over pre-read hop reserves
pub fn amounts_in_with_reserves(amount_out: u128, reserves: &[(u128, u128)]) -> ExchangeResult<Vec<u128>> {
    if amount_out == 0 {
        return Err(ValidationError::ZeroAmount { what: "output amount" }.into());
    }

    let mut amounts = vec![0u128; reserves.len() + 1];
    amounts[reserves.len()] = amount_out;
    for hop in (0..reserves.len()).rev() {
        let (reserve_in, reserve_out) = reserves[hop];
        amounts[hop] = V2Math::get_amount_in(amounts[hop + 1], reserve_in, reserve_out)?;
        trace!(hop, reserve_in, reserve_out, amount_in = amounts[hop], "quoted hop in reverse");
    }
    Ok(amounts)
}
