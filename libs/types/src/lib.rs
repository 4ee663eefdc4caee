//! # Torq Exchange Types
//!
//! Shared type system for the constant-product exchange core.
//!
//! ## Design Philosophy
//!
//! - **Typed Identifiers**: accounts, tokens and pairs are distinct 20-byte wrappers
//! - **No Precision Loss**: all amounts are raw `u128` smallest units
//! - **Canonical Pairs**: [`PairKey`] orders tokens so every unordered pair has one identity
//! - **One Error Taxonomy**: [`ExchangeError`] with validation, expiry, slippage,
//!   liquidity and transfer kinds
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{PairKey, PairRecord, Reserves, TokenAddress};
//!
//! let dai = TokenAddress([0x6b; 20]);
//! let usdc = TokenAddress([0x27; 20]);
//!
//! let record = PairRecord::new(PairKey::new(dai, usdc)?);
//! let reserves = Reserves::new(1_000, 2_000);
//!
//! // Reserves oriented for a DAI -> USDC trade
//! assert_eq!(reserves.oriented(&record.key, dai), (2_000, 1_000));
//! # Ok::<(), types::ValidationError>(())
//! ```

pub mod common;
pub mod precision;

pub use common::errors::{
    ErrorKind, ExchangeError, ExchangeResult, LiquidityError, SlippageError, TransferError,
    ValidationError,
};
pub use common::identifiers::{sort_tokens, Address, PairAddress, PairKey, Token, TokenAddress};
pub use common::pair::{PairRecord, Reserves};
