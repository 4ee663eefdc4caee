//! # Exchange State - Pair Registry and Reserve Store
//!
//! ## Purpose
//!
//! Owns every piece of mutable exchange state: which pairs exist and what
//! each pair's reserves are. The swap engine and liquidity manager borrow
//! these objects per call; nothing here is global.
//!
//! ## Integration Points
//!
//! - **Pricing**: [`MarketView`] implements `amm::ReserveSource`
//! - **Settlement**: [`ReserveStore::lock_pairs`] and reserve checkpoints back
//!   the router's settlement scope
//! - **Persistence**: both components implement [`Stateful`] (bincode snapshots)
//!
//! ## Architecture Role
//!
//! ```text
//! Router ──get_or_create──▶ [PairRegistry] ──ensure_pair──▶ [ReserveStore]
//!    │                                                           ▲
//!    └──quote──▶ amm ──get_reserves──▶ [MarketView] ─────────────┘
//! ```

pub mod market_view;
pub mod registry;
pub mod reserve_store;
pub mod traits;

pub use market_view::MarketView;
pub use registry::PairRegistry;
pub use reserve_store::{PairLockSet, ReserveCheckpoint, ReserveStore, StoreStats};
pub use traits::{StateError, Stateful};
