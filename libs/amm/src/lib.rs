//! # Torq AMM Library - Constant-Product Pricing Engine
//!
//! ## Purpose
//!
//! Pure pricing functions for a single-curve (x*y=k, 0.3% fee) exchange:
//! proportional quotes, single-hop output/input amounts, multi-hop path
//! amounts and optimal liquidity deposit sizing. Nothing here mutates state.
//!
//! ## Integration Points
//!
//! - **Input Sources**: current reserves through the [`ReserveSource`] trait
//! - **Output Destinations**: the swap engine and liquidity manager in `torq-router`
//! - **Precision**: raw `u128` smallest units, 256-bit intermediates, floor rounding
//!
//! ## Guarantees
//!
//! - `get_amount_out(..) < reserve_out` for every valid input
//! - `(reserve_in + amount_in) * (reserve_out - amount_out) >= reserve_in * reserve_out`
//! - Path quotes read every hop's reserves once, up front

pub mod optimal_deposit;
pub mod path;
pub mod pool_traits;
pub mod v2_math;

pub use optimal_deposit::{DepositBounds, OptimalDeposit, OptimalDepositCalculator};
pub use path::{get_amounts_in, get_amounts_out, validate_path};
pub use pool_traits::ReserveSource;
pub use v2_math::{V2Math, FEE_BPS, FEE_DENOMINATOR, FEE_NUMERATOR};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
