//! Constant-product (x*y=k) math with exact integer arithmetic
//!
//! Every intermediate product is computed in 256 bits and floored, so the
//! pool side always keeps the rounding remainder: the product invariant can
//! only grow across a swap.

use primitive_types::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use types::{ExchangeError, ExchangeResult, LiquidityError, ValidationError};

/// Fee multiplier numerator: 997/1000 keeps 0.3% of every input in the pool
pub const FEE_NUMERATOR: u128 = 997;

/// Fee multiplier denominator
pub const FEE_DENOMINATOR: u128 = 1000;

/// Fee in basis points, for reporting
pub const FEE_BPS: u32 = 30;

/// V2 AMM math functions with zero precision loss
pub struct V2Math;

impl V2Math {
    /// Proportional counterpart amount at the current price
    ///
    /// `amount_b = floor(amount_a * reserve_b / reserve_a)`, no fee applied.
    pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> ExchangeResult<u128> {
        if amount_a == 0 {
            return Err(ValidationError::ZeroAmount { what: "quote amount" }.into());
        }
        if reserve_a == 0 || reserve_b == 0 {
            return Err(LiquidityError::ZeroReserves.into());
        }

        let amount_b = U256::from(amount_a)
            .checked_mul(U256::from(reserve_b))
            .ok_or_else(|| ExchangeError::overflow("quote"))?
            / U256::from(reserve_a);

        narrow(amount_b, "quote")
    }

    /// Exact output amount for a given input, after the 0.3% fee
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount (smallest units)
    /// * `reserve_in` - Input token reserve
    /// * `reserve_out` - Output token reserve
    ///
    /// The result is always strictly below `reserve_out`.
    pub fn get_amount_out(amount_in: u128, reserve_in: u128, reserve_out: u128) -> ExchangeResult<u128> {
        if amount_in == 0 {
            return Err(ValidationError::ZeroAmount { what: "input amount" }.into());
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(LiquidityError::ZeroReserves.into());
        }

        let amount_in_with_fee = U256::from(amount_in) * U256::from(FEE_NUMERATOR);
        let numerator = amount_in_with_fee
            .checked_mul(U256::from(reserve_out))
            .ok_or_else(|| ExchangeError::overflow("get_amount_out"))?;
        let denominator = U256::from(reserve_in) * U256::from(FEE_DENOMINATOR) + amount_in_with_fee;

        narrow(numerator / denominator, "get_amount_out")
    }

    /// Minimum input required to receive `amount_out`, after the 0.3% fee
    ///
    /// Rounds up by one unit so the returned input always suffices.
    pub fn get_amount_in(amount_out: u128, reserve_in: u128, reserve_out: u128) -> ExchangeResult<u128> {
        if amount_out == 0 {
            return Err(ValidationError::ZeroAmount { what: "output amount" }.into());
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(LiquidityError::ZeroReserves.into());
        }
        if amount_out >= reserve_out {
            return Err(LiquidityError::InsufficientReserve {
                requested: amount_out,
                reserve: reserve_out,
            }
            .into());
        }

        let numerator = U256::from(reserve_in)
            .checked_mul(U256::from(amount_out))
            .and_then(|n| n.checked_mul(U256::from(FEE_DENOMINATOR)))
            .ok_or_else(|| ExchangeError::overflow("get_amount_in"))?;
        let denominator = U256::from(reserve_out - amount_out) * U256::from(FEE_NUMERATOR);

        narrow(numerator / denominator + U256::one(), "get_amount_in")
    }

    /// Fee-adjusted constant-product check used by pair settlement
    ///
    /// `(balance0*1000 - in0*3) * (balance1*1000 - in1*3) >= reserve0*reserve1*1000^2`
    pub fn fee_adjusted_k_holds(
        balances: (u128, u128),
        amounts_in: (u128, u128),
        reserves: (u128, u128),
    ) -> bool {
        let fee_taken = U256::from(FEE_DENOMINATOR - FEE_NUMERATOR);
        let scale = U256::from(FEE_DENOMINATOR);

        let adjusted0 = U256::from(balances.0) * scale;
        let adjusted1 = U256::from(balances.1) * scale;
        let fee0 = U256::from(amounts_in.0) * fee_taken;
        let fee1 = U256::from(amounts_in.1) * fee_taken;
        if adjusted0 < fee0 || adjusted1 < fee1 {
            return false;
        }

        let lhs = (adjusted0 - fee0).full_mul(adjusted1 - fee1);
        let rhs = U256::from(reserves.0).full_mul(U256::from(reserves.1)) * primitive_types::U512::from(scale * scale);
        lhs >= rhs
    }

    /// Price impact of a trade in basis points (reporting only)
    ///
    /// Compares the execution price against the pre-trade spot price.
    pub fn price_impact_bps(amount_in: u128, reserve_in: u128, reserve_out: u128) -> ExchangeResult<Decimal> {
        let amount_out = Self::get_amount_out(amount_in, reserve_in, reserve_out)?;

        let to_decimal = |value: u128| {
            Decimal::from_u128(value).ok_or_else(|| ExchangeError::overflow("price_impact_bps"))
        };
        let spot_price = to_decimal(reserve_out)? / to_decimal(reserve_in)?;
        let execution_price = to_decimal(amount_out)? / to_decimal(amount_in)?;

        Ok(((dec!(1) - execution_price / spot_price) * dec!(10000)).round_dp(2))
    }
}

/// Narrow a 256-bit intermediate back to `u128`
fn narrow(value: U256, operation: &'static str) -> ExchangeResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(ExchangeError::overflow(operation));
    }
    Ok(value.low_u128())
}
