//! Liquidity Manager
//!
//! Deposits are sized by [`amm::OptimalDepositCalculator`] so they never move
//! the pair's price; the liquidity credit itself is computed by the pair
//! collaborator's `mint`. Assets always reach custody before `mint` or
//! `burn` is called.

use crate::collaborators::{Clock, Collaborators};
use crate::requests::{
    LiquidityReceipt, LiquidityRequest, NativeLiquidityRequest, NativeRemoveLiquidityRequest,
    RemovalReceipt, RemoveLiquidityRequest,
};
use crate::router::Router;
use amm::{DepositBounds, OptimalDepositCalculator};
use exchange_state::MarketView;
use tracing::{info, warn};
use types::{Address, ExchangeResult, SlippageError, TokenAddress};

/// A deposit after request-shape differences are resolved
struct Deposit {
    token_a: TokenAddress,
    token_b: TokenAddress,
    bounds: DepositBounds,
    to: Address,
    deadline: Option<u64>,
    /// Native value attached to the call; side `b` is the wrapped native token
    native_value: Option<u128>,
}

/// A redemption after request-shape differences are resolved
struct Removal {
    token_a: TokenAddress,
    token_b: TokenAddress,
    liquidity: u128,
    amount_a_min: u128,
    amount_b_min: u128,
    to: Address,
    deadline: Option<u64>,
    /// Side `b` is the wrapped native token and is paid out unwrapped
    native_out: bool,
}

impl<C: Collaborators, K: Clock> Router<C, K> {
    /// Deposit `token_a`/`token_b` at the current price, creating the pair if needed
    pub fn add_liquidity(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &LiquidityRequest,
    ) -> ExchangeResult<LiquidityReceipt> {
        let deposit = Deposit {
            token_a: request.token_a,
            token_b: request.token_b,
            bounds: DepositBounds {
                amount_a_desired: request.amount_a_desired,
                amount_b_desired: request.amount_b_desired,
                amount_a_min: request.amount_a_min,
                amount_b_min: request.amount_b_min,
            },
            to: request.to,
            deadline: request.deadline,
            native_value: None,
        };
        self.logged("add_liquidity", || self.run_deposit(market, caller, &deposit))
    }

    /// Deposit `token` against attached native value
    ///
    /// The receipt is ordered `(token, native)`. Native value beyond what the
    /// current price calls for is refunded to the caller.
    pub fn add_liquidity_native(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &NativeLiquidityRequest,
    ) -> ExchangeResult<LiquidityReceipt> {
        let deposit = Deposit {
            token_a: request.token,
            token_b: self.wrapped_native,
            bounds: DepositBounds {
                amount_a_desired: request.amount_token_desired,
                amount_b_desired: request.native_value,
                amount_a_min: request.amount_token_min,
                amount_b_min: request.amount_native_min,
            },
            to: request.to,
            deadline: request.deadline,
            native_value: Some(request.native_value),
        };
        self.logged("add_liquidity_native", || self.run_deposit(market, caller, &deposit))
    }

    /// Redeem liquidity credit for both underlying tokens
    pub fn remove_liquidity(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &RemoveLiquidityRequest,
    ) -> ExchangeResult<RemovalReceipt> {
        let removal = Removal {
            token_a: request.token_a,
            token_b: request.token_b,
            liquidity: request.liquidity,
            amount_a_min: request.amount_a_min,
            amount_b_min: request.amount_b_min,
            to: request.to,
            deadline: request.deadline,
            native_out: false,
        };
        self.logged("remove_liquidity", || self.run_removal(market, caller, &removal))
    }

    /// Redeem liquidity credit of a token/wrapped-native pair; the receipt is
    /// ordered `(token, native)`
    pub fn remove_liquidity_native(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &NativeRemoveLiquidityRequest,
    ) -> ExchangeResult<RemovalReceipt> {
        let removal = Removal {
            token_a: request.token,
            token_b: self.wrapped_native,
            liquidity: request.liquidity,
            amount_a_min: request.amount_token_min,
            amount_b_min: request.amount_native_min,
            to: request.to,
            deadline: request.deadline,
            native_out: true,
        };
        self.logged("remove_liquidity_native", || self.run_removal(market, caller, &removal))
    }

    fn logged<T: std::fmt::Debug>(
        &self,
        operation: &'static str,
        run: impl FnOnce() -> ExchangeResult<T>,
    ) -> ExchangeResult<T> {
        let request_id = self.next_request_id();
        match run() {
            Ok(receipt) => {
                info!(request_id, operation, ?receipt, "liquidity settled");
                Ok(receipt)
            }
            Err(error) => {
                warn!(request_id, operation, kind = ?error.kind(), %error, "liquidity operation failed");
                Err(error)
            }
        }
    }

    fn run_deposit(
        &self,
        market: MarketView<'_>,
        caller: Address,
        deposit: &Deposit,
    ) -> ExchangeResult<LiquidityReceipt> {
        if let Some(deadline) = deposit.deadline {
            self.check_deadline(deadline)?;
        }
        Self::check_recipient(deposit.to)?;
        Self::check_positive(deposit.bounds.amount_a_desired, "desired amount A")?;
        Self::check_positive(deposit.bounds.amount_b_desired, "desired amount B")?;

        let pair = market
            .registry
            .get_or_create(market.reserves, deposit.token_a, deposit.token_b)?;
        let scope = self.open_scope(market.reserves, &[pair.address]);

        let (reserve_a, reserve_b) = market.pair_reserves(&pair).oriented(&pair.key, deposit.token_a);
        let amounts = OptimalDepositCalculator::calculate(&deposit.bounds, reserve_a, reserve_b)?;

        let custody = pair.address.account();
        match deposit.native_value {
            None => {
                self.collaborators
                    .transfer_from(deposit.token_a, caller, custody, amounts.amount_a)?;
                self.collaborators
                    .transfer_from(deposit.token_b, caller, custody, amounts.amount_b)?;
            }
            Some(native_value) => {
                self.collaborators.receive_native(caller, native_value)?;
                self.collaborators
                    .transfer_from(deposit.token_a, caller, custody, amounts.amount_a)?;
                self.collaborators.deposit(amounts.amount_b)?;
                self.collaborators
                    .transfer(self.wrapped_native, custody, amounts.amount_b)?;
            }
        }

        let liquidity = self.collaborators.mint(market.reserves, &pair, deposit.to)?;

        if let Some(native_value) = deposit.native_value {
            let refund = native_value - amounts.amount_b;
            if refund > 0 {
                self.collaborators.send_native(caller, refund)?;
            }
        }

        scope.commit();
        Ok(LiquidityReceipt {
            amount_a: amounts.amount_a,
            amount_b: amounts.amount_b,
            liquidity,
        })
    }

    fn run_removal(
        &self,
        market: MarketView<'_>,
        caller: Address,
        removal: &Removal,
    ) -> ExchangeResult<RemovalReceipt> {
        if let Some(deadline) = removal.deadline {
            self.check_deadline(deadline)?;
        }
        Self::check_recipient(removal.to)?;
        Self::check_positive(removal.liquidity, "liquidity")?;

        let pair = market.pair(removal.token_a, removal.token_b)?;
        let scope = self.open_scope(market.reserves, &[pair.address]);

        let custody = pair.address.account();
        self.collaborators
            .transfer_from(pair.address.liquidity_token(), caller, custody, removal.liquidity)?;

        let recipient = if removal.native_out { self.engine } else { removal.to };
        let (amount0, amount1) = self.collaborators.burn(market.reserves, &pair, recipient)?;
        let (amount_a, amount_b) = if pair.key.is_token0(removal.token_a) {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        };

        if amount_a < removal.amount_a_min {
            return Err(SlippageError::InsufficientAmountA {
                amount: amount_a,
                minimum: removal.amount_a_min,
            }
            .into());
        }
        if amount_b < removal.amount_b_min {
            return Err(SlippageError::InsufficientAmountB {
                amount: amount_b,
                minimum: removal.amount_b_min,
            }
            .into());
        }

        if removal.native_out {
            self.collaborators.transfer(removal.token_a, removal.to, amount_a)?;
            self.collaborators.withdraw(amount_b)?;
            self.collaborators.send_native(removal.to, amount_b)?;
        }

        scope.commit();
        Ok(RemovalReceipt { amount_a, amount_b })
    }
}
