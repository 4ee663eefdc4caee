//! In-memory reference ledger
//!
//! Implements every collaborator trait over plain maps, with constant-product
//! pair semantics:
//!
//! - swap input is detected from the custody balance delta and the payout is
//!   accepted only if the fee-adjusted product does not decrease
//! - the first mint locks [`MINIMUM_LIQUIDITY`] at the zero address and
//!   credits `sqrt(a * b) - MINIMUM_LIQUIDITY`
//! - later mints credit `min(a * supply / reserve0, b * supply / reserve1)`
//! - burn pays `liquidity * balance / supply` of each token
//!
//! Every pair operation writes the custody balances back to the reserve
//! store as the new reserves.
//!
//! The journal is an undo log kept per thread: while a checkpoint is open,
//! every balance, native and supply change made on that thread is recorded,
//! and a rollback applies the inverse changes newest-first. Work done on other
//! threads, or committed under a later checkpoint, is never touched.

use crate::collaborators::{AssetLedger, Journal, NativeAsset, PairContract};
use amm::V2Math;
use exchange_state::ReserveStore;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::HashMap;
use std::thread::{self, ThreadId};
use tracing::{debug, warn};
use types::{
    Address, ExchangeError, ExchangeResult, LiquidityError, PairAddress, PairRecord, Reserves,
    TokenAddress, TransferError, ValidationError,
};

/// Liquidity permanently locked by the first mint of every pair
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(TokenAddress, Address), u128>,
    native: HashMap<Address, u128>,
    total_supply: HashMap<PairAddress, u128>,
    journals: HashMap<ThreadId, ThreadJournal>,
}

/// Open checkpoints and recorded changes of one thread
#[derive(Debug, Default)]
struct ThreadJournal {
    depth: usize,
    entries: Vec<Change>,
}

/// A single recorded mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Credited { token: TokenAddress, owner: Address, amount: u128 },
    Debited { token: TokenAddress, owner: Address, amount: u128 },
    NativeCredited { owner: Address, amount: u128 },
    NativeDebited { owner: Address, amount: u128 },
    /// Supply only changes under the pair's operation lock
    Supply { pair: PairAddress, previous: u128 },
}

impl LedgerState {
    fn record(&mut self, change: Change) {
        if let Some(journal) = self.journals.get_mut(&thread::current().id()) {
            journal.entries.push(change);
        }
    }

    fn revert(&mut self, change: Change) {
        let shortfall = match change {
            Change::Credited { token, owner, amount } => {
                let balance = self.balances.entry((token, owner)).or_insert(0);
                let shortfall = amount.saturating_sub(*balance);
                *balance = balance.saturating_sub(amount);
                shortfall
            }
            Change::Debited { token, owner, amount } => {
                let balance = self.balances.entry((token, owner)).or_insert(0);
                *balance = balance.saturating_add(amount);
                0
            }
            Change::NativeCredited { owner, amount } => {
                let balance = self.native.entry(owner).or_insert(0);
                let shortfall = amount.saturating_sub(*balance);
                *balance = balance.saturating_sub(amount);
                shortfall
            }
            Change::NativeDebited { owner, amount } => {
                let balance = self.native.entry(owner).or_insert(0);
                *balance = balance.saturating_add(amount);
                0
            }
            Change::Supply { pair, previous } => {
                self.total_supply.insert(pair, previous);
                0
            }
        };
        if shortfall > 0 {
            warn!(?change, shortfall, "credit already spent; rollback clamped at zero");
        }
    }

    fn balance(&self, token: TokenAddress, owner: Address) -> u128 {
        self.balances.get(&(token, owner)).copied().unwrap_or(0)
    }

    fn credit(&mut self, token: TokenAddress, owner: Address, amount: u128) -> ExchangeResult<()> {
        let balance = self.balances.entry((token, owner)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| ExchangeError::overflow("token credit"))?;
        self.record(Change::Credited { token, owner, amount });
        Ok(())
    }

    fn debit(&mut self, token: TokenAddress, owner: Address, amount: u128) -> ExchangeResult<()> {
        let available = self.balance(token, owner);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                token,
                available,
                required: amount,
            }
            .into());
        }
        self.balances.insert((token, owner), available - amount);
        self.record(Change::Debited { token, owner, amount });
        Ok(())
    }

    fn move_tokens(&mut self, token: TokenAddress, from: Address, to: Address, amount: u128) -> ExchangeResult<()> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)
    }

    fn native_balance(&self, owner: Address) -> u128 {
        self.native.get(&owner).copied().unwrap_or(0)
    }

    fn credit_native(&mut self, owner: Address, amount: u128) -> ExchangeResult<()> {
        let balance = self.native.entry(owner).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| ExchangeError::overflow("native credit"))?;
        self.record(Change::NativeCredited { owner, amount });
        Ok(())
    }

    fn move_native(&mut self, from: Address, to: Address, amount: u128) -> ExchangeResult<()> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(TransferError::InsufficientNative {
                available,
                required: amount,
            }
            .into());
        }
        self.native.insert(from, available - amount);
        self.record(Change::NativeDebited { owner: from, amount });
        self.credit_native(to, amount)
    }

    fn supply(&self, pair: PairAddress) -> u128 {
        self.total_supply.get(&pair).copied().unwrap_or(0)
    }

    fn set_supply(&mut self, pair: PairAddress, supply: u128) {
        let previous = self.total_supply.insert(pair, supply).unwrap_or(0);
        self.record(Change::Supply { pair, previous });
    }
}

/// Position in the calling thread's undo log, see [`Journal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerCheckpoint {
    thread: ThreadId,
    mark: usize,
}

/// Balances, native value and liquidity supply held in memory
#[derive(Debug)]
pub struct InMemoryLedger {
    engine: Address,
    wrapped_native: TokenAddress,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(engine: Address, wrapped_native: TokenAddress) -> Self {
        Self {
            engine,
            wrapped_native,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn engine(&self) -> Address {
        self.engine
    }

    /// Create `amount` of `token` out of thin air for `owner`
    pub fn mint_tokens(&self, token: TokenAddress, owner: Address, amount: u128) -> ExchangeResult<()> {
        self.state.lock().credit(token, owner, amount)
    }

    /// Give `owner` native value
    pub fn fund_native(&self, owner: Address, amount: u128) -> ExchangeResult<()> {
        self.state.lock().credit_native(owner, amount)
    }

    pub fn balance_of(&self, token: TokenAddress, owner: Address) -> u128 {
        self.state.lock().balance(token, owner)
    }

    pub fn native_balance_of(&self, owner: Address) -> u128 {
        self.state.lock().native_balance(owner)
    }

    /// Liquidity credit of `owner` in `pair`
    pub fn liquidity_of(&self, pair: PairAddress, owner: Address) -> u128 {
        self.state.lock().balance(pair.liquidity_token(), owner)
    }

    pub fn total_supply(&self, pair: PairAddress) -> u128 {
        self.state.lock().supply(pair)
    }

    /// Native value backing the wrapped token is held at the token's own account
    fn wrapped_custody(&self) -> Address {
        Address(self.wrapped_native.0)
    }
}

impl AssetLedger for InMemoryLedger {
    fn transfer(&self, token: TokenAddress, to: Address, amount: u128) -> ExchangeResult<()> {
        self.state.lock().move_tokens(token, self.engine, to, amount)
    }

    fn transfer_from(&self, token: TokenAddress, from: Address, to: Address, amount: u128) -> ExchangeResult<()> {
        self.state.lock().move_tokens(token, from, to, amount)
    }
}

impl NativeAsset for InMemoryLedger {
    fn receive_native(&self, from: Address, amount: u128) -> ExchangeResult<()> {
        self.state.lock().move_native(from, self.engine, amount)
    }

    fn deposit(&self, amount: u128) -> ExchangeResult<()> {
        let mut state = self.state.lock();
        state.move_native(self.engine, self.wrapped_custody(), amount)?;
        state.credit(self.wrapped_native, self.engine, amount)
    }

    fn withdraw(&self, amount: u128) -> ExchangeResult<()> {
        let mut state = self.state.lock();
        state.debit(self.wrapped_native, self.engine, amount)?;
        state.move_native(self.wrapped_custody(), self.engine, amount)
    }

    fn send_native(&self, to: Address, amount: u128) -> ExchangeResult<()> {
        self.state.lock().move_native(self.engine, to, amount)
    }
}

impl PairContract for InMemoryLedger {
    fn swap(
        &self,
        reserves: &ReserveStore,
        pair: &PairRecord,
        amount0_out: u128,
        amount1_out: u128,
        to: Address,
    ) -> ExchangeResult<()> {
        if amount0_out == 0 && amount1_out == 0 {
            return Err(ValidationError::ZeroAmount { what: "output amount" }.into());
        }

        let current = reserves.reserves(pair.address);
        for (requested, reserve) in [(amount0_out, current.reserve0), (amount1_out, current.reserve1)] {
            if requested >= reserve {
                return Err(LiquidityError::InsufficientLiquidity {
                    pair: pair.address,
                    requested,
                    reserve,
                }
                .into());
            }
        }

        let custody = pair.address.account();
        let mut state = self.state.lock();

        // Balances as they will stand after the payout
        let balance0 = payout_balance(&state, pair.token0(), custody, amount0_out)?;
        let balance1 = payout_balance(&state, pair.token1(), custody, amount1_out)?;

        let amount0_in = balance0.saturating_sub(current.reserve0 - amount0_out);
        let amount1_in = balance1.saturating_sub(current.reserve1 - amount1_out);
        if amount0_in == 0 && amount1_in == 0 {
            return Err(LiquidityError::InsufficientInputAmount.into());
        }

        if !V2Math::fee_adjusted_k_holds(
            (balance0, balance1),
            (amount0_in, amount1_in),
            (current.reserve0, current.reserve1),
        ) {
            return Err(LiquidityError::KInvariant { pair: pair.address }.into());
        }

        if amount0_out > 0 {
            state.move_tokens(pair.token0(), custody, to, amount0_out)?;
        }
        if amount1_out > 0 {
            state.move_tokens(pair.token1(), custody, to, amount1_out)?;
        }
        drop(state);

        reserves.set_reserves(pair.address, Reserves::new(balance0, balance1));
        debug!(
            pair = %pair.address,
            amount0_in,
            amount1_in,
            amount0_out,
            amount1_out,
            to = %to,
            "pair swap"
        );
        Ok(())
    }

    fn mint(&self, reserves: &ReserveStore, pair: &PairRecord, to: Address) -> ExchangeResult<u128> {
        let current = reserves.reserves(pair.address);
        let custody = pair.address.account();
        let liquidity_token = pair.address.liquidity_token();
        let mut state = self.state.lock();

        let balance0 = state.balance(pair.token0(), custody);
        let balance1 = state.balance(pair.token1(), custody);
        let amount0 = balance0
            .checked_sub(current.reserve0)
            .ok_or(LiquidityError::InsufficientInputAmount)?;
        let amount1 = balance1
            .checked_sub(current.reserve1)
            .ok_or(LiquidityError::InsufficientInputAmount)?;

        let total_supply = state.supply(pair.address);
        let liquidity = if total_supply == 0 {
            let root = (U256::from(amount0) * U256::from(amount1)).integer_sqrt().low_u128();
            root.saturating_sub(MINIMUM_LIQUIDITY)
        } else {
            if current.reserve0 == 0 || current.reserve1 == 0 {
                return Err(LiquidityError::ZeroReserves.into());
            }
            mul_div(amount0, total_supply, current.reserve0)?.min(mul_div(
                amount1,
                total_supply,
                current.reserve1,
            )?)
        };
        if liquidity == 0 {
            return Err(LiquidityError::InsufficientLiquidityMinted.into());
        }

        let mut minted = liquidity;
        if total_supply == 0 {
            state.credit(liquidity_token, Address::ZERO, MINIMUM_LIQUIDITY)?;
            minted += MINIMUM_LIQUIDITY;
        }
        let supply = total_supply
            .checked_add(minted)
            .ok_or_else(|| ExchangeError::overflow("liquidity supply"))?;
        state.credit(liquidity_token, to, liquidity)?;
        state.set_supply(pair.address, supply);
        drop(state);

        reserves.set_reserves(pair.address, Reserves::new(balance0, balance1));
        debug!(pair = %pair.address, amount0, amount1, liquidity, to = %to, "pair mint");
        Ok(liquidity)
    }

    fn burn(&self, reserves: &ReserveStore, pair: &PairRecord, to: Address) -> ExchangeResult<(u128, u128)> {
        let custody = pair.address.account();
        let liquidity_token = pair.address.liquidity_token();
        let mut state = self.state.lock();

        let liquidity = state.balance(liquidity_token, custody);
        let total_supply = state.supply(pair.address);
        if total_supply == 0 {
            return Err(LiquidityError::InsufficientLiquidityBurned.into());
        }

        let balance0 = state.balance(pair.token0(), custody);
        let balance1 = state.balance(pair.token1(), custody);
        let amount0 = mul_div(liquidity, balance0, total_supply)?;
        let amount1 = mul_div(liquidity, balance1, total_supply)?;
        if amount0 == 0 || amount1 == 0 {
            return Err(LiquidityError::InsufficientLiquidityBurned.into());
        }

        state.debit(liquidity_token, custody, liquidity)?;
        state.set_supply(pair.address, total_supply - liquidity);
        state.move_tokens(pair.token0(), custody, to, amount0)?;
        state.move_tokens(pair.token1(), custody, to, amount1)?;
        drop(state);

        reserves.set_reserves(
            pair.address,
            Reserves::new(balance0 - amount0, balance1 - amount1),
        );
        debug!(pair = %pair.address, liquidity, amount0, amount1, to = %to, "pair burn");
        Ok((amount0, amount1))
    }
}

impl InMemoryLedger {
    /// Close `checkpoint`, returning the changes recorded after it
    fn close(state: &mut LedgerState, checkpoint: LedgerCheckpoint) -> Vec<Change> {
        let Some(journal) = state.journals.get_mut(&checkpoint.thread) else {
            return Vec::new();
        };
        let mark = checkpoint.mark.min(journal.entries.len());
        let tail = journal.entries.split_off(mark);
        journal.depth = journal.depth.saturating_sub(1);
        if journal.depth == 0 {
            state.journals.remove(&checkpoint.thread);
        }
        tail
    }
}

impl Journal for InMemoryLedger {
    type Checkpoint = LedgerCheckpoint;

    fn checkpoint(&self) -> LedgerCheckpoint {
        let thread = thread::current().id();
        let mut state = self.state.lock();
        let journal = state.journals.entry(thread).or_default();
        journal.depth += 1;
        LedgerCheckpoint {
            thread,
            mark: journal.entries.len(),
        }
    }

    fn commit(&self, checkpoint: LedgerCheckpoint) {
        Self::close(&mut self.state.lock(), checkpoint);
    }

    fn rollback(&self, checkpoint: LedgerCheckpoint) {
        let mut state = self.state.lock();
        let undone = Self::close(&mut state, checkpoint);
        debug!(changes = undone.len(), "ledger rollback");
        for change in undone.into_iter().rev() {
            state.revert(change);
        }
    }
}

fn payout_balance(state: &LedgerState, token: TokenAddress, custody: Address, amount_out: u128) -> ExchangeResult<u128> {
    let available = state.balance(token, custody);
    available.checked_sub(amount_out).ok_or_else(|| {
        TransferError::InsufficientBalance {
            token,
            available,
            required: amount_out,
        }
        .into()
    })
}

/// `floor(a * b / denominator)` with a 256-bit product
fn mul_div(a: u128, b: u128, denominator: u128) -> ExchangeResult<u128> {
    let value = U256::from(a) * U256::from(b) / U256::from(denominator);
    if value > U256::from(u128::MAX) {
        return Err(ExchangeError::overflow("mul_div"));
    }
    Ok(value.low_u128())
}
