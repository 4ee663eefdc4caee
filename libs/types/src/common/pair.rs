//! Pair records and reserve snapshots

use crate::common::identifiers::{PairAddress, PairKey, TokenAddress};
use serde::{Deserialize, Serialize};

/// The two reserve balances of a pair, in canonical token order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve0: u128,
    pub reserve1: u128,
}

impl Reserves {
    pub const EMPTY: Self = Self {
        reserve0: 0,
        reserve1: 0,
    };

    pub const fn new(reserve0: u128, reserve1: u128) -> Self {
        Self { reserve0, reserve1 }
    }

    /// Both sides are zero: the pair has never been funded
    pub fn is_empty(&self) -> bool {
        self.reserve0 == 0 && self.reserve1 == 0
    }

    /// Reserves ordered as `(token, other)` for a token of `key`
    pub fn oriented(&self, key: &PairKey, token: TokenAddress) -> (u128, u128) {
        if key.is_token0(token) {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }
}

/// A registered pair: its canonical key and derived address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairRecord {
    pub key: PairKey,
    pub address: PairAddress,
}

impl PairRecord {
    pub fn new(key: PairKey) -> Self {
        Self {
            address: key.pair_address(),
            key,
        }
    }

    pub fn token0(&self) -> TokenAddress {
        self.key.token0
    }

    pub fn token1(&self) -> TokenAddress {
        self.key.token1
    }

    /// Split an amount paid out in `token_out` into `(amount0_out, amount1_out)`
    pub fn amounts_out(&self, token_out: TokenAddress, amount: u128) -> (u128, u128) {
        if self.key.is_token0(token_out) {
            (amount, 0)
        } else {
            (0, amount)
        }
    }
}
