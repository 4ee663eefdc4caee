//! Optimal deposit sizing for proportional liquidity
//!
//! Given what a provider is willing to deposit on each side, picks the
//! largest deposit that keeps the pool's current price and stays within both
//! desired ceilings and both minimum floors.

use crate::v2_math::V2Math;
use serde::{Deserialize, Serialize};
use types::{ExchangeResult, SlippageError};

/// What a liquidity provider is willing to deposit, ordered `(a, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositBounds {
    pub amount_a_desired: u128,
    pub amount_b_desired: u128,
    pub amount_a_min: u128,
    pub amount_b_min: u128,
}

impl DepositBounds {
    /// Bounds with no minimum on either side
    pub fn desired(amount_a_desired: u128, amount_b_desired: u128) -> Self {
        Self {
            amount_a_desired,
            amount_b_desired,
            amount_a_min: 0,
            amount_b_min: 0,
        }
    }
}

/// The deposit actually made, ordered `(a, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimalDeposit {
    pub amount_a: u128,
    pub amount_b: u128,
    /// First deposit into an empty pair; it sets the initial price
    pub bootstrap: bool,
}

/// Calculates deposit amounts that preserve the current price ratio
pub struct OptimalDepositCalculator;

impl OptimalDepositCalculator {
    /// `reserve_a`/`reserve_b` are the current reserves ordered as the bounds
    pub fn calculate(bounds: &DepositBounds, reserve_a: u128, reserve_b: u128) -> ExchangeResult<OptimalDeposit> {
        if reserve_a == 0 && reserve_b == 0 {
            return Ok(OptimalDeposit {
                amount_a: bounds.amount_a_desired,
                amount_b: bounds.amount_b_desired,
                bootstrap: true,
            });
        }

        let amount_b_optimal = V2Math::quote(bounds.amount_a_desired, reserve_a, reserve_b)?;
        if amount_b_optimal <= bounds.amount_b_desired {
            if amount_b_optimal < bounds.amount_b_min {
                return Err(SlippageError::InsufficientAmountB {
                    amount: amount_b_optimal,
                    minimum: bounds.amount_b_min,
                }
                .into());
            }
            return Ok(OptimalDeposit {
                amount_a: bounds.amount_a_desired,
                amount_b: amount_b_optimal,
                bootstrap: false,
            });
        }

        let amount_a_optimal = V2Math::quote(bounds.amount_b_desired, reserve_b, reserve_a)?;
        // b_optimal overshot, so the a side computed from desired b cannot exceed desired a
        debug_assert!(amount_a_optimal <= bounds.amount_a_desired);
        if amount_a_optimal < bounds.amount_a_min {
            return Err(SlippageError::InsufficientAmountA {
                amount: amount_a_optimal,
                minimum: bounds.amount_a_min,
            }
            .into());
        }
        Ok(OptimalDeposit {
            amount_a: amount_a_optimal,
            amount_b: bounds.amount_b_desired,
            bootstrap: false,
        })
    }
}
