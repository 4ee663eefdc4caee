//! Swap Engine
//!
//! Every swap moves through `Pending -> Validated -> Quoted -> Settled`, or
//! stops in `Failed` from any earlier stage. Pair locks are taken between
//! Validate and Quote and held until the swap settles or fails, so the quote
//! and the settlement observe the same reserves.

use crate::collaborators::{Clock, Collaborators};
use crate::requests::{ExactOutputRequest, NativeSwapRequest, SwapRequest};
use crate::router::Router;
use crate::settlement::SettlementPlan;
use exchange_state::MarketView;
use tracing::{debug, info, warn};
use types::{Address, ExchangeError, ExchangeResult, SlippageError, TokenAddress};

/// Lifecycle stage of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    Pending,
    Validated,
    Quoted,
    Settled,
}

struct SwapProgress {
    request_id: u64,
    operation: &'static str,
    stage: SwapStage,
}

impl SwapProgress {
    fn start(request_id: u64, operation: &'static str) -> Self {
        debug!(request_id, operation, stage = ?SwapStage::Pending, "swap received");
        Self {
            request_id,
            operation,
            stage: SwapStage::Pending,
        }
    }

    fn advance(&mut self, stage: SwapStage) {
        debug!(
            request_id = self.request_id,
            operation = self.operation,
            from = ?self.stage,
            to = ?stage,
            "swap stage"
        );
        self.stage = stage;
    }

    fn fail(&self, error: &ExchangeError) {
        warn!(
            request_id = self.request_id,
            operation = self.operation,
            stage = ?self.stage,
            kind = ?error.kind(),
            %error,
            "swap failed"
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum Pricing {
    ExactIn { amount_in: u128, amount_out_min: u128 },
    ExactOut { amount_out: u128, amount_in_max: u128 },
}

/// How the path input reaches the first pair
#[derive(Debug, Clone, Copy)]
enum Funding {
    Tokens { from: Address },
    Native { from: Address, value: u128 },
}

/// How the path output reaches the recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payout {
    Tokens,
    Native,
}

struct SwapOrder<'r> {
    pricing: Pricing,
    path: &'r [TokenAddress],
    to: Address,
    deadline: u64,
    funding: Funding,
    payout: Payout,
}

impl<C: Collaborators, K: Clock> Router<C, K> {
    /// Output amounts for `amount_in` along `path` at current reserves
    pub fn get_amounts_out(
        &self,
        market: MarketView<'_>,
        amount_in: u128,
        path: &[TokenAddress],
    ) -> ExchangeResult<Vec<u128>> {
        amm::get_amounts_out(&market, amount_in, path)
    }

    /// Input amounts needed for `amount_out` along `path` at current reserves
    pub fn get_amounts_in(
        &self,
        market: MarketView<'_>,
        amount_out: u128,
        path: &[TokenAddress],
    ) -> ExchangeResult<Vec<u128>> {
        amm::get_amounts_in(&market, amount_out, path)
    }

    /// Swap exactly `amount_in` of `path[0]` for at least `amount_out_min` of `path[last]`
    pub fn swap_exact_tokens_for_tokens(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &SwapRequest,
    ) -> ExchangeResult<Vec<u128>> {
        self.execute_swap(
            market,
            "swap_exact_tokens_for_tokens",
            SwapOrder {
                pricing: Pricing::ExactIn {
                    amount_in: request.amount_in,
                    amount_out_min: request.amount_out_min,
                },
                path: &request.path,
                to: request.to,
                deadline: request.deadline,
                funding: Funding::Tokens { from: caller },
                payout: Payout::Tokens,
            },
        )
    }

    /// Swap the attached native value, wrapped, along a path starting at the wrapped native token
    pub fn swap_exact_native_for_tokens(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &NativeSwapRequest,
    ) -> ExchangeResult<Vec<u128>> {
        self.execute_swap(
            market,
            "swap_exact_native_for_tokens",
            SwapOrder {
                pricing: Pricing::ExactIn {
                    amount_in: request.native_value,
                    amount_out_min: request.amount_out_min,
                },
                path: &request.path,
                to: request.to,
                deadline: request.deadline,
                funding: Funding::Native {
                    from: caller,
                    value: request.native_value,
                },
                payout: Payout::Tokens,
            },
        )
    }

    /// Swap exactly `amount_in` tokens along a path ending at the wrapped
    /// native token; the recipient receives unwrapped native value
    pub fn swap_exact_tokens_for_native(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &SwapRequest,
    ) -> ExchangeResult<Vec<u128>> {
        self.execute_swap(
            market,
            "swap_exact_tokens_for_native",
            SwapOrder {
                pricing: Pricing::ExactIn {
                    amount_in: request.amount_in,
                    amount_out_min: request.amount_out_min,
                },
                path: &request.path,
                to: request.to,
                deadline: request.deadline,
                funding: Funding::Tokens { from: caller },
                payout: Payout::Native,
            },
        )
    }

    /// Receive exactly `amount_out` of `path[last]`, spending at most `amount_in_max`
    pub fn swap_tokens_for_exact_tokens(
        &self,
        market: MarketView<'_>,
        caller: Address,
        request: &ExactOutputRequest,
    ) -> ExchangeResult<Vec<u128>> {
        self.execute_swap(
            market,
            "swap_tokens_for_exact_tokens",
            SwapOrder {
                pricing: Pricing::ExactOut {
                    amount_out: request.amount_out,
                    amount_in_max: request.amount_in_max,
                },
                path: &request.path,
                to: request.to,
                deadline: request.deadline,
                funding: Funding::Tokens { from: caller },
                payout: Payout::Tokens,
            },
        )
    }

    fn execute_swap(
        &self,
        market: MarketView<'_>,
        operation: &'static str,
        order: SwapOrder<'_>,
    ) -> ExchangeResult<Vec<u128>> {
        let mut progress = SwapProgress::start(self.next_request_id(), operation);

        match self.run_swap(market, &order, &mut progress) {
            Ok(amounts) => {
                progress.advance(SwapStage::Settled);
                info!(
                    request_id = progress.request_id,
                    operation,
                    hops = order.path.len() - 1,
                    amount_in = amounts[0],
                    amount_out = amounts[amounts.len() - 1],
                    to = %order.to,
                    "swap settled"
                );
                Ok(amounts)
            }
            Err(error) => {
                progress.fail(&error);
                Err(error)
            }
        }
    }

    fn run_swap(
        &self,
        market: MarketView<'_>,
        order: &SwapOrder<'_>,
        progress: &mut SwapProgress,
    ) -> ExchangeResult<Vec<u128>> {
        // Validate
        self.check_deadline(order.deadline)?;
        amm::validate_path(order.path)?;
        Self::check_recipient(order.to)?;
        match order.pricing {
            Pricing::ExactIn { amount_in, .. } => Self::check_positive(amount_in, "input amount")?,
            Pricing::ExactOut { amount_out, .. } => Self::check_positive(amount_out, "output amount")?,
        }
        if let Funding::Native { .. } = order.funding {
            self.check_wrapped_native(order.path[0], "start")?;
        }
        if order.payout == Payout::Native {
            self.check_wrapped_native(order.path[order.path.len() - 1], "end")?;
        }
        let pairs = market.path_pairs(order.path)?;
        progress.advance(SwapStage::Validated);

        let pair_addresses: Vec<_> = pairs.iter().map(|pair| pair.address).collect();
        let scope = self.open_scope(market.reserves, &pair_addresses);

        // Quote
        let amounts = match order.pricing {
            Pricing::ExactIn {
                amount_in,
                amount_out_min,
            } => {
                let amounts = amm::get_amounts_out(&market, amount_in, order.path)?;
                let quoted = amounts[amounts.len() - 1];
                if quoted < amount_out_min {
                    return Err(SlippageError::InsufficientOutput {
                        quoted,
                        minimum: amount_out_min,
                    }
                    .into());
                }
                amounts
            }
            Pricing::ExactOut {
                amount_out,
                amount_in_max,
            } => {
                let amounts = amm::get_amounts_in(&market, amount_out, order.path)?;
                if amounts[0] > amount_in_max {
                    return Err(SlippageError::ExcessiveInput {
                        required: amounts[0],
                        maximum: amount_in_max,
                    }
                    .into());
                }
                amounts
            }
        };
        let final_destination = match order.payout {
            Payout::Tokens => order.to,
            Payout::Native => self.engine,
        };
        let plan = SettlementPlan::build(&pairs, order.path, &amounts, final_destination);
        progress.advance(SwapStage::Quoted);

        // Settle
        let entry = pairs[0].address.account();
        match order.funding {
            Funding::Tokens { from } => {
                self.collaborators
                    .transfer_from(order.path[0], from, entry, amounts[0])?;
            }
            Funding::Native { from, value } => {
                self.collaborators.receive_native(from, value)?;
                self.collaborators.deposit(amounts[0])?;
                self.collaborators
                    .transfer(self.wrapped_native, entry, amounts[0])?;
            }
        }

        plan.execute(&self.collaborators, market.reserves, progress.request_id)?;

        if order.payout == Payout::Native {
            let amount_out = amounts[amounts.len() - 1];
            self.collaborators.withdraw(amount_out)?;
            self.collaborators.send_native(order.to, amount_out)?;
        }

        scope.commit();
        Ok(amounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FixedClock, PairContract};
    use crate::ledger::InMemoryLedger;
    use exchange_state::{PairRegistry, ReserveStore};
    use types::{ErrorKind, LiquidityError, Reserves, ValidationError};

    const ENGINE: Address = Address([0xee; 20]);
    const WRAPPED: TokenAddress = TokenAddress([0xcc; 20]);
    const ALICE: Address = Address([0xa1; 20]);
    const BOB: Address = Address([0xb0; 20]);
    const NOW: u64 = 1_700_000_000;

    fn token(byte: u8) -> TokenAddress {
        TokenAddress([byte; 20])
    }

    struct Fixture {
        registry: PairRegistry,
        store: ReserveStore,
        router: Router<InMemoryLedger, FixedClock>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: PairRegistry::new(),
                store: ReserveStore::new(),
                router: Router::with_addresses(
                    ENGINE,
                    WRAPPED,
                    InMemoryLedger::new(ENGINE, WRAPPED),
                    FixedClock(NOW),
                ),
            }
        }

        fn market(&self) -> MarketView<'_> {
            MarketView::new(&self.registry, &self.store)
        }

        /// Pair seeded directly in custody and reserves
        fn seed(&self, a: TokenAddress, b: TokenAddress, reserve_a: u128, reserve_b: u128) {
            let record = self.registry.get_or_create(&self.store, a, b).unwrap();
            let ledger = self.router.collaborators();
            ledger.mint_tokens(a, record.address.account(), reserve_a).unwrap();
            ledger.mint_tokens(b, record.address.account(), reserve_b).unwrap();
            ledger.mint(&self.store, &record, BOB).unwrap();
        }

        fn reserves(&self, a: TokenAddress, b: TokenAddress) -> Reserves {
            self.store.reserves(self.registry.get(a, b).unwrap().address)
        }
    }

    fn request(amount_in: u128, amount_out_min: u128, path: Vec<TokenAddress>) -> SwapRequest {
        SwapRequest {
            amount_in,
            amount_out_min,
            path,
            to: ALICE,
            deadline: NOW + 60,
        }
    }

    #[test]
    fn test_single_hop_exact_in() {
        let fx = Fixture::new();
        fx.seed(token(1), token(2), 1_000_000, 1_000_000);
        fx.router.collaborators().mint_tokens(token(1), ALICE, 1_000).unwrap();

        let amounts = fx
            .router
            .swap_exact_tokens_for_tokens(fx.market(), ALICE, &request(1_000, 0, vec![token(1), token(2)]))
            .unwrap();

        assert_eq!(amounts, vec![1_000, 996]);
        let ledger = fx.router.collaborators();
        assert_eq!(ledger.balance_of(token(1), ALICE), 0);
        assert_eq!(ledger.balance_of(token(2), ALICE), 996);
        assert_eq!(fx.reserves(token(1), token(2)), Reserves::new(1_001_000, 999_004));
    }

    #[test]
    fn test_slippage_leaves_reserves_untouched() {
        let fx = Fixture::new();
        fx.seed(token(1), token(2), 1_000_000, 1_000_000);
        fx.router.collaborators().mint_tokens(token(1), ALICE, 1_000).unwrap();

        let quoted = fx
            .router
            .get_amounts_out(fx.market(), 1_000, &[token(1), token(2)])
            .unwrap()[1];
        let err = fx
            .router
            .swap_exact_tokens_for_tokens(
                fx.market(),
                ALICE,
                &request(1_000, quoted + 1, vec![token(1), token(2)]),
            )
            .unwrap_err();

        assert_eq!(
            err,
            ExchangeError::Slippage(SlippageError::InsufficientOutput {
                quoted,
                minimum: quoted + 1
            })
        );
        assert_eq!(fx.reserves(token(1), token(2)), Reserves::new(1_000_000, 1_000_000));
        assert_eq!(fx.router.collaborators().balance_of(token(1), ALICE), 1_000);
    }

    #[test]
    fn test_validation_failures() {
        let fx = Fixture::new();
        fx.seed(token(1), token(2), 1_000_000, 1_000_000);

        let err = fx
            .router
            .swap_exact_tokens_for_tokens(fx.market(), ALICE, &request(1_000, 0, vec![token(1)]))
            .unwrap_err();
        assert_eq!(err, ExchangeError::Validation(ValidationError::PathTooShort { len: 1 }));
        assert_eq!(fx.reserves(token(1), token(2)), Reserves::new(1_000_000, 1_000_000));

        let mut expired = request(1_000, 0, vec![token(1), token(2)]);
        expired.deadline = NOW - 1;
        let err = fx
            .router
            .swap_exact_tokens_for_tokens(fx.market(), ALICE, &expired)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);

        let mut nobody = request(1_000, 0, vec![token(1), token(2)]);
        nobody.to = Address::ZERO;
        let err = fx
            .router
            .swap_exact_tokens_for_tokens(fx.market(), ALICE, &nobody)
            .unwrap_err();
        assert_eq!(err, ExchangeError::Validation(ValidationError::ZeroAddress));

        let err = fx
            .router
            .swap_exact_tokens_for_tokens(fx.market(), ALICE, &request(0, 0, vec![token(1), token(2)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = fx
            .router
            .swap_exact_tokens_for_tokens(fx.market(), ALICE, &request(1_000, 0, vec![token(1), token(3)]))
            .unwrap_err();
        assert_eq!(
            err,
            ExchangeError::Liquidity(LiquidityError::PairNotFound {
                token_a: token(1),
                token_b: token(3)
            })
        );
    }

    #[test]
    fn test_insufficient_balance_rolls_back() {
        let fx = Fixture::new();
        fx.seed(token(1), token(2), 1_000_000, 1_000_000);

        let err = fx
            .router
            .swap_exact_tokens_for_tokens(fx.market(), ALICE, &request(1_000, 0, vec![token(1), token(2)]))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(fx.reserves(token(1), token(2)), Reserves::new(1_000_000, 1_000_000));
    }

    #[test]
    fn test_exact_out_respects_maximum() {
        let fx = Fixture::new();
        fx.seed(token(1), token(2), 1_000_000, 1_000_000);
        fx.router.collaborators().mint_tokens(token(1), ALICE, 10_000).unwrap();

        let exact = ExactOutputRequest {
            amount_out: 996,
            amount_in_max: 1_000,
            path: vec![token(1), token(2)],
            to: ALICE,
            deadline: NOW,
        };
        let amounts = fx
            .router
            .swap_tokens_for_exact_tokens(fx.market(), ALICE, &exact)
            .unwrap();
        assert_eq!(amounts[1], 996);
        assert!(amounts[0] <= 1_000);
        assert_eq!(fx.router.collaborators().balance_of(token(2), ALICE), 996);

        let tight = ExactOutputRequest {
            amount_in_max: 10,
            ..exact
        };
        let err = fx
            .router
            .swap_tokens_for_exact_tokens(fx.market(), ALICE, &tight)
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Slippage(SlippageError::ExcessiveInput { maximum: 10, .. })
        ));
    }

    #[test]
    fn test_native_paths_must_use_wrapped_token() {
        let fx = Fixture::new();
        fx.seed(token(1), token(2), 1_000_000, 1_000_000);

        let native_in = NativeSwapRequest {
            native_value: 1_000,
            amount_out_min: 0,
            path: vec![token(1), token(2)],
            to: ALICE,
            deadline: NOW,
        };
        let err = fx
            .router
            .swap_exact_native_for_tokens(fx.market(), ALICE, &native_in)
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Validation(ValidationError::NotWrappedNative { position: "start", .. })
        ));

        let err = fx
            .router
            .swap_exact_tokens_for_native(fx.market(), ALICE, &request(1_000, 0, vec![token(1), token(2)]))
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Validation(ValidationError::NotWrappedNative { position: "end", .. })
        ));
    }
}
