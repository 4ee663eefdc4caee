//! # Torq Router - Swap Engine and Liquidity Manager
//!
//! ## Purpose
//!
//! Executes swaps and liquidity operations against a constant-product
//! exchange. Every operation validates, quotes against current reserves and
//! settles through injected collaborators, all under exclusive locks of the
//! pairs it touches.
//!
//! ## Integration Points
//!
//! - **State**: borrows `exchange_state::MarketView` (registry + reserve store) per call
//! - **Pricing**: `amm` path and deposit math
//! - **Assets**: [`collaborators`] traits; [`ledger::InMemoryLedger`] is the reference implementation
//! - **Configuration**: [`Router::new`] takes `torq_config::RouterSettings`
//!
//! ## Settlement Guarantees
//!
//! - No asset or reserve moves before the quote passes its slippage bound
//! - Multi-hop output is paid directly into the next pair's custody
//! - A failure anywhere in settlement rolls back reserves and collaborator state
//!
//! ```rust
//! use exchange_state::{MarketView, PairRegistry, ReserveStore};
//! use torq_router::{FixedClock, InMemoryLedger, LiquidityRequest, Router, SwapRequest};
//! use types::{Address, TokenAddress};
//!
//! let (engine, weth) = (Address([0xee; 20]), TokenAddress([0xcc; 20]));
//! let (usdc, alice) = (TokenAddress([0x27; 20]), Address([0xa1; 20]));
//!
//! let router = Router::with_addresses(engine, weth, InMemoryLedger::new(engine, weth), FixedClock(0));
//! let (registry, reserves) = (PairRegistry::new(), ReserveStore::new());
//! let market = MarketView::new(&registry, &reserves);
//!
//! router.collaborators().mint_tokens(usdc, alice, 2_000_000)?;
//! router.collaborators().mint_tokens(weth, alice, 1_000_000)?;
//! router.add_liquidity(market, alice, &LiquidityRequest::new(usdc, weth, 1_000_000, 1_000_000, alice))?;
//!
//! let request = SwapRequest { amount_in: 1_000, amount_out_min: 990, path: vec![usdc, weth], to: alice, deadline: 60 };
//! let amounts = router.swap_exact_tokens_for_tokens(market, alice, &request)?;
//! assert_eq!(amounts, vec![1_000, 996]);
//! # Ok::<(), types::ExchangeError>(())
//! ```

pub mod collaborators;
pub mod ledger;
pub mod liquidity;
pub mod market_file;
pub mod requests;
pub mod router;
pub mod settlement;
pub mod swap_engine;

pub use collaborators::{
    AssetLedger, Clock, Collaborators, FixedClock, Journal, NativeAsset, PairContract, SystemClock,
};
pub use ledger::{InMemoryLedger, LedgerCheckpoint, MINIMUM_LIQUIDITY};
pub use market_file::{MarketFile, PoolEntry};
pub use requests::{
    ExactOutputRequest, LiquidityReceipt, LiquidityRequest, NativeLiquidityRequest,
    NativeRemoveLiquidityRequest, NativeSwapRequest, RemovalReceipt, RemoveLiquidityRequest,
    SwapRequest,
};
pub use router::Router;
pub use settlement::{PlannedHop, SettlementPlan, SettlementScope};
pub use swap_engine::SwapStage;
