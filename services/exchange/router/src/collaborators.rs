//! Capabilities the router needs from the outside world
//!
//! The router never moves assets itself. Token balances, pair accounting,
//! native value and time all come through these traits so an embedder can
//! back them with a real ledger and tests can substitute recording doubles.
//!
//! All methods take `&self`; implementations use interior mutability.

use chrono::Utc;
use exchange_state::ReserveStore;
use types::{Address, ExchangeResult, PairRecord, TokenAddress};

/// Fungible token balances
pub trait AssetLedger {
    /// Move `amount` of `token` from the engine's own account to `to`
    fn transfer(&self, token: TokenAddress, to: Address, amount: u128) -> ExchangeResult<()>;

    /// Move `amount` of `token` from `from` to `to`
    fn transfer_from(&self, token: TokenAddress, from: Address, to: Address, amount: u128) -> ExchangeResult<()>;
}

/// Pair-side settlement
///
/// Each call reconciles the pair's custody balances against the reserves in
/// `reserves` and writes the new reserves back.
pub trait PairContract {
    /// Pay `(amount0_out, amount1_out)` to `to`; input must already sit in
    /// the pair's custody account
    fn swap(
        &self,
        reserves: &ReserveStore,
        pair: &PairRecord,
        amount0_out: u128,
        amount1_out: u128,
        to: Address,
    ) -> ExchangeResult<()>;

    /// Credit `to` with liquidity for the deposit sitting in custody
    fn mint(&self, reserves: &ReserveStore, pair: &PairRecord, to: Address) -> ExchangeResult<u128>;

    /// Redeem the liquidity credit held by the pair itself, paying `to`
    fn burn(&self, reserves: &ReserveStore, pair: &PairRecord, to: Address) -> ExchangeResult<(u128, u128)>;
}

/// Native value and its wrapped token
pub trait NativeAsset {
    /// Accept native value attached to a call by `from`
    fn receive_native(&self, from: Address, amount: u128) -> ExchangeResult<()>;

    /// Wrap native value held by the engine
    fn deposit(&self, amount: u128) -> ExchangeResult<()>;

    /// Unwrap wrapped tokens held by the engine
    fn withdraw(&self, amount: u128) -> ExchangeResult<()>;

    /// Pay native value from the engine to `to`
    fn send_native(&self, to: Address, amount: u128) -> ExchangeResult<()>;
}

/// All-or-nothing support for the collaborator side of a settlement
pub trait Journal {
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;

    /// Keep everything done since `checkpoint`
    fn commit(&self, checkpoint: Self::Checkpoint);

    /// Undo everything this operation did since `checkpoint`, leaving
    /// unrelated concurrent work in place
    fn rollback(&self, checkpoint: Self::Checkpoint);
}

/// Everything a router needs, as one bound
pub trait Collaborators: AssetLedger + PairContract + NativeAsset + Journal {}

impl<T: AssetLedger + PairContract + NativeAsset + Journal> Collaborators for T {}

/// Source of the current time for deadline checks
pub trait Clock {
    /// Unix seconds
    fn now(&self) -> u64;

    /// Deadline `window_secs` from now
    fn deadline_after(&self, window_secs: u64) -> u64 {
        self.now().saturating_add(window_secs)
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u64 {
        (**self).now()
    }
}
