//! Reserve invariants under random and concurrent swaps

use exchange_state::{MarketView, PairRegistry, ReserveStore};
use primitive_types::U256;
use proptest::prelude::*;
use torq_router::{
    AssetLedger, FixedClock, InMemoryLedger, LiquidityRequest, Router, SettlementScope, SwapRequest,
};
use types::{Address, ErrorKind, Reserves, TokenAddress};

const ENGINE: Address = Address([0xee; 20]);
const WRAPPED: TokenAddress = TokenAddress([0xcc; 20]);
const LP: Address = Address([0x1b; 20]);
const TRADER: Address = Address([0xa1; 20]);
const TOKEN_A: TokenAddress = TokenAddress([0x0a; 20]);
const TOKEN_B: TokenAddress = TokenAddress([0x0b; 20]);
const TOKEN_C: TokenAddress = TokenAddress([0x0c; 20]);
const TOKEN_D: TokenAddress = TokenAddress([0x0d; 20]);

struct Market {
    registry: PairRegistry,
    store: ReserveStore,
    router: Router<InMemoryLedger, FixedClock>,
}

impl Market {
    fn new() -> Self {
        Self {
            registry: PairRegistry::new(),
            store: ReserveStore::new(),
            router: Router::with_addresses(ENGINE, WRAPPED, InMemoryLedger::new(ENGINE, WRAPPED), FixedClock(0)),
        }
    }

    fn view(&self) -> MarketView<'_> {
        MarketView::new(&self.registry, &self.store)
    }

    fn ledger(&self) -> &InMemoryLedger {
        self.router.collaborators()
    }

    fn seed(&self, a: TokenAddress, b: TokenAddress, amount_a: u128, amount_b: u128) {
        self.ledger().mint_tokens(a, LP, amount_a).unwrap();
        self.ledger().mint_tokens(b, LP, amount_b).unwrap();
        self.router
            .add_liquidity(self.view(), LP, &LiquidityRequest::new(a, b, amount_a, amount_b, LP))
            .unwrap();
    }

    fn reserves(&self, a: TokenAddress, b: TokenAddress) -> Reserves {
        self.store.reserves(self.registry.get(a, b).unwrap().address)
    }
}

fn product(reserves: Reserves) -> U256 {
    U256::from(reserves.reserve0) * U256::from(reserves.reserve1)
}

fn swap(path: Vec<TokenAddress>, amount_in: u128, amount_out_min: u128, to: Address) -> SwapRequest {
    SwapRequest {
        amount_in,
        amount_out_min,
        path,
        to,
        deadline: 0,
    }
}

proptest! {
    #[test]
    fn prop_settled_output_matches_quote_and_k_grows(
        reserve_a in 1_000_000u128..1_000_000_000_000,
        reserve_b in 1_000_000u128..1_000_000_000_000,
        reserve_c in 1_000_000u128..1_000_000_000_000,
        amount_in in 1_000u128..1_000_000_000,
    ) {
        let market = Market::new();
        market.seed(TOKEN_A, TOKEN_B, reserve_a, reserve_b);
        market.seed(TOKEN_B, TOKEN_C, reserve_b, reserve_c);
        market.ledger().mint_tokens(TOKEN_A, TRADER, amount_in).unwrap();

        let path = vec![TOKEN_A, TOKEN_B, TOKEN_C];
        let k_ab = product(market.reserves(TOKEN_A, TOKEN_B));
        let k_bc = product(market.reserves(TOKEN_B, TOKEN_C));

        let quoted = market.router.get_amounts_out(market.view(), amount_in, &path);
        let settled = market
            .router
            .swap_exact_tokens_for_tokens(market.view(), TRADER, &swap(path, amount_in, 0, TRADER));

        match quoted {
            Ok(quoted) if quoted[2] > 0 => {
                let settled = settled.unwrap();
                prop_assert_eq!(&settled, &quoted);
                prop_assert_eq!(market.ledger().balance_of(TOKEN_C, TRADER), quoted[2]);
                prop_assert!(product(market.reserves(TOKEN_A, TOKEN_B)) >= k_ab);
                prop_assert!(product(market.reserves(TOKEN_B, TOKEN_C)) >= k_bc);
            }
            _ => {
                prop_assert!(settled.is_err());
                prop_assert_eq!(market.ledger().balance_of(TOKEN_A, TRADER), amount_in);
            }
        }
    }

    #[test]
    fn prop_minimum_above_quote_never_settles(
        reserve_a in 1_000_000u128..1_000_000_000_000,
        reserve_b in 1_000_000u128..1_000_000_000_000,
        amount_in in 1_000u128..1_000_000_000,
    ) {
        let market = Market::new();
        market.seed(TOKEN_A, TOKEN_B, reserve_a, reserve_b);
        market.ledger().mint_tokens(TOKEN_A, TRADER, amount_in).unwrap();
        let before = market.reserves(TOKEN_A, TOKEN_B);

        let path = vec![TOKEN_A, TOKEN_B];
        let quoted = market.router.get_amounts_out(market.view(), amount_in, &path).unwrap()[1];
        let err = market
            .router
            .swap_exact_tokens_for_tokens(market.view(), TRADER, &swap(path, amount_in, quoted + 1, TRADER))
            .unwrap_err();

        prop_assert_eq!(err.kind(), ErrorKind::Slippage);
        prop_assert_eq!(market.reserves(TOKEN_A, TOKEN_B), before);
        prop_assert_eq!(market.ledger().balance_of(TOKEN_A, TRADER), amount_in);
    }
}

#[test]
fn concurrent_swaps_keep_custody_and_reserves_in_step() {
    const TRADERS: u8 = 8;
    const ROUNDS: usize = 25;

    let market = Market::new();
    market.seed(TOKEN_A, TOKEN_B, 100_000_000, 100_000_000);
    market.seed(TOKEN_B, TOKEN_C, 100_000_000, 100_000_000);
    let k_before = product(market.reserves(TOKEN_A, TOKEN_B));

    let traders: Vec<Address> = (0..TRADERS).map(|i| Address([0x40 + i; 20])).collect();
    for trader in &traders {
        market.ledger().mint_tokens(TOKEN_A, *trader, 1_000_000).unwrap();
        market.ledger().mint_tokens(TOKEN_C, *trader, 1_000_000).unwrap();
    }

    std::thread::scope(|scope| {
        for (index, trader) in traders.iter().enumerate() {
            let market = &market;
            scope.spawn(move || {
                // Half the traders run the path backwards so locks are requested in both orders
                let path = if index % 2 == 0 {
                    vec![TOKEN_A, TOKEN_B, TOKEN_C]
                } else {
                    vec![TOKEN_C, TOKEN_B, TOKEN_A]
                };
                for _ in 0..ROUNDS {
                    market
                        .router
                        .swap_exact_tokens_for_tokens(market.view(), *trader, &swap(path.clone(), 1_000, 1, *trader))
                        .unwrap();
                }
            });
        }
    });

    for (a, b) in [(TOKEN_A, TOKEN_B), (TOKEN_B, TOKEN_C)] {
        let pair = market.registry.get(a, b).unwrap();
        let reserves = market.store.reserves(pair.address);
        let custody = pair.address.account();
        assert_eq!(market.ledger().balance_of(pair.token0(), custody), reserves.reserve0);
        assert_eq!(market.ledger().balance_of(pair.token1(), custody), reserves.reserve1);
    }
    assert!(product(market.reserves(TOKEN_A, TOKEN_B)) > k_before);

    // Token A is conserved between traders and the A/B pair
    let held: u128 = traders
        .iter()
        .map(|trader| market.ledger().balance_of(TOKEN_A, *trader))
        .sum();
    let pair_ab = market.registry.get(TOKEN_A, TOKEN_B).unwrap();
    let pooled = market.ledger().balance_of(TOKEN_A, pair_ab.address.account());
    assert_eq!(held + pooled, u128::from(TRADERS) * 1_000_000 + 100_000_000);
}

/// A/B operation that fails while a C/D swap commits, on the same or another thread
fn failed_operation_beside_committed_swap(other_thread: bool) {
    let market = Market::new();
    market.seed(TOKEN_A, TOKEN_B, 1_000_000, 1_000_000);
    market.seed(TOKEN_C, TOKEN_D, 1_000_000, 1_000_000);
    let trader_cd = Address([0xd1; 20]);
    market.ledger().mint_tokens(TOKEN_A, TRADER, 5_000).unwrap();
    market.ledger().mint_tokens(TOKEN_C, trader_cd, 1_000).unwrap();

    let pair_ab = market.registry.get(TOKEN_A, TOKEN_B).unwrap();
    let pair_cd = market.registry.get(TOKEN_C, TOKEN_D).unwrap();
    let swap_cd = || {
        market
            .router
            .swap_exact_tokens_for_tokens(market.view(), trader_cd, &swap(vec![TOKEN_C, TOKEN_D], 1_000, 1, trader_cd))
            .unwrap()
    };

    let scope = SettlementScope::open(&market.store, market.ledger(), &[pair_ab.address]);
    market
        .ledger()
        .transfer_from(TOKEN_A, TRADER, pair_ab.address.account(), 5_000)
        .unwrap();
    let amounts = if other_thread {
        std::thread::scope(|threads| threads.spawn(swap_cd).join().unwrap())
    } else {
        swap_cd()
    };
    drop(scope);

    assert_eq!(amounts, vec![1_000, 996]);
    assert_eq!(market.ledger().balance_of(TOKEN_D, trader_cd), 996);
    let reserves_cd = market.store.reserves(pair_cd.address);
    let custody_cd = pair_cd.address.account();
    assert_eq!(market.ledger().balance_of(pair_cd.token0(), custody_cd), reserves_cd.reserve0);
    assert_eq!(market.ledger().balance_of(pair_cd.token1(), custody_cd), reserves_cd.reserve1);

    assert_eq!(market.ledger().balance_of(TOKEN_A, TRADER), 5_000);
    assert_eq!(market.ledger().balance_of(TOKEN_A, pair_ab.address.account()), 1_000_000);
    assert_eq!(market.reserves(TOKEN_A, TOKEN_B), Reserves::new(1_000_000, 1_000_000));
}

#[test]
fn rollback_keeps_swap_committed_on_another_thread() {
    failed_operation_beside_committed_swap(true);
}

#[test]
fn rollback_keeps_swap_committed_inside_its_scope() {
    failed_operation_beside_committed_swap(false);
}
