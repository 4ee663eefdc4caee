//! Request and receipt types for router operations
//!
//! Requests are built by the caller, consumed by exactly one call and never
//! stored. Amounts are raw smallest units.

use serde::{Deserialize, Serialize};
use types::{Address, TokenAddress};

/// Exact-input swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub amount_in: u128,
    pub amount_out_min: u128,
    pub path: Vec<TokenAddress>,
    pub to: Address,
    /// Unix seconds
    pub deadline: u64,
}

/// Exact-input swap paid with native value attached to the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeSwapRequest {
    pub native_value: u128,
    pub amount_out_min: u128,
    /// Must start with the wrapped native token
    pub path: Vec<TokenAddress>,
    pub to: Address,
    pub deadline: u64,
}

/// Exact-output swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactOutputRequest {
    pub amount_out: u128,
    pub amount_in_max: u128,
    pub path: Vec<TokenAddress>,
    pub to: Address,
    pub deadline: u64,
}

/// Proportional deposit into a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRequest {
    pub token_a: TokenAddress,
    pub token_b: TokenAddress,
    pub amount_a_desired: u128,
    pub amount_b_desired: u128,
    #[serde(default)]
    pub amount_a_min: u128,
    #[serde(default)]
    pub amount_b_min: u128,
    pub to: Address,
    #[serde(default)]
    pub deadline: Option<u64>,
}

impl LiquidityRequest {
    /// Request with no minimums and no deadline
    pub fn new(
        token_a: TokenAddress,
        token_b: TokenAddress,
        amount_a_desired: u128,
        amount_b_desired: u128,
        to: Address,
    ) -> Self {
        Self {
            token_a,
            token_b,
            amount_a_desired,
            amount_b_desired,
            amount_a_min: 0,
            amount_b_min: 0,
            to,
            deadline: None,
        }
    }
}

/// Deposit of a token against native value attached to the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeLiquidityRequest {
    pub token: TokenAddress,
    pub amount_token_desired: u128,
    #[serde(default)]
    pub amount_token_min: u128,
    #[serde(default)]
    pub amount_native_min: u128,
    pub to: Address,
    #[serde(default)]
    pub deadline: Option<u64>,
    /// Upper bound on the native side; any excess is refunded
    pub native_value: u128,
}

/// Redemption of liquidity credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityRequest {
    pub token_a: TokenAddress,
    pub token_b: TokenAddress,
    pub liquidity: u128,
    #[serde(default)]
    pub amount_a_min: u128,
    #[serde(default)]
    pub amount_b_min: u128,
    pub to: Address,
    #[serde(default)]
    pub deadline: Option<u64>,
}

/// Redemption of liquidity credit in a token/wrapped-native pair, paid out
/// as the token plus native value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeRemoveLiquidityRequest {
    pub token: TokenAddress,
    pub liquidity: u128,
    #[serde(default)]
    pub amount_token_min: u128,
    #[serde(default)]
    pub amount_native_min: u128,
    pub to: Address,
    #[serde(default)]
    pub deadline: Option<u64>,
}

/// Outcome of a deposit, ordered as the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub amount_a: u128,
    pub amount_b: u128,
    pub liquidity: u128,
}

/// Outcome of a redemption, ordered as the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReceipt {
    pub amount_a: u128,
    pub amount_b: u128,
}
