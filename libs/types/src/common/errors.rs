//! Error taxonomy for the exchange core
//!
//! Every engine operation fails with an [`ExchangeError`]. The five kinds
//! (validation, expiry, slippage, liquidity, transfer) are all terminal for
//! the current operation; retry policy belongs to the caller.

use crate::common::identifiers::{PairAddress, TokenAddress};
use thiserror::Error;

/// Malformed request or input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("identical tokens: {token}")]
    IdenticalTokens { token: TokenAddress },

    #[error("zero address")]
    ZeroAddress,

    #[error("invalid address: '{input}'")]
    InvalidAddress { input: String },

    #[error("path too short: {len} tokens, need at least 2")]
    PathTooShort { len: usize },

    #[error("path repeats token {token} in consecutive positions")]
    RepeatedToken { token: TokenAddress },

    #[error("{what} must be positive")]
    ZeroAmount { what: &'static str },

    #[error("path must {position} with the wrapped native token {expected}, found {found}")]
    NotWrappedNative {
        position: &'static str,
        expected: TokenAddress,
        found: TokenAddress,
    },

    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },
}

/// Quoted amounts fall outside the caller's bounds
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlippageError {
    #[error("insufficient output amount: quoted {quoted}, minimum {minimum}")]
    InsufficientOutput { quoted: u128, minimum: u128 },

    #[error("excessive input amount: required {required}, maximum {maximum}")]
    ExcessiveInput { required: u128, maximum: u128 },

    #[error("insufficient amount of token A: {amount} below minimum {minimum}")]
    InsufficientAmountA { amount: u128, minimum: u128 },

    #[error("insufficient amount of token B: {amount} below minimum {minimum}")]
    InsufficientAmountB { amount: u128, minimum: u128 },
}

/// Reserves cannot support the requested computation or settlement
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiquidityError {
    #[error("zero reserves")]
    ZeroReserves,

    #[error("no pair for tokens ({token_a}, {token_b})")]
    PairNotFound {
        token_a: TokenAddress,
        token_b: TokenAddress,
    },

    #[error("insufficient liquidity in {pair}: requested {requested}, reserve {reserve}")]
    InsufficientLiquidity {
        pair: PairAddress,
        requested: u128,
        reserve: u128,
    },

    #[error("requested {requested} of a reserve of {reserve}")]
    InsufficientReserve { requested: u128, reserve: u128 },

    #[error("insufficient liquidity minted")]
    InsufficientLiquidityMinted,

    #[error("insufficient liquidity burned")]
    InsufficientLiquidityBurned,

    #[error("insufficient input amount")]
    InsufficientInputAmount,

    #[error("constant product decreased in {pair}")]
    KInvariant { pair: PairAddress },
}

/// An underlying asset movement failed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient balance of {token}: have {available}, need {required}")]
    InsufficientBalance {
        token: TokenAddress,
        available: u128,
        required: u128,
    },

    #[error("insufficient native balance: have {available}, need {required}")]
    InsufficientNative { available: u128, required: u128 },

    #[error("transfer rejected: {reason}")]
    Rejected { reason: String },
}

/// Top-level error returned by every exchange operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("expired: deadline {deadline} is before current time {now}")]
    Expired { deadline: u64, now: u64 },

    #[error("slippage: {0}")]
    Slippage(#[from] SlippageError),

    #[error("liquidity: {0}")]
    Liquidity(#[from] LiquidityError),

    #[error("transfer: {0}")]
    Transfer(#[from] TransferError),
}

/// Coarse classification of an [`ExchangeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Expired,
    Slippage,
    Liquidity,
    Transfer,
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::Validation(_) => ErrorKind::Validation,
            ExchangeError::Expired { .. } => ErrorKind::Expired,
            ExchangeError::Slippage(_) => ErrorKind::Slippage,
            ExchangeError::Liquidity(_) => ErrorKind::Liquidity,
            ExchangeError::Transfer(_) => ErrorKind::Transfer,
        }
    }

    pub fn overflow(operation: &'static str) -> Self {
        ExchangeError::Validation(ValidationError::Overflow { operation })
    }
}

pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err: ExchangeError = ValidationError::PathTooShort { len: 1 }.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: ExchangeError = SlippageError::InsufficientOutput {
            quoted: 90,
            minimum: 91,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Slippage);

        let err = ExchangeError::Expired {
            deadline: 10,
            now: 11,
        };
        assert_eq!(err.kind(), ErrorKind::Expired);

        let err: ExchangeError = LiquidityError::ZeroReserves.into();
        assert_eq!(err.kind(), ErrorKind::Liquidity);
    }

    #[test]
    fn test_messages_carry_context() {
        let err: ExchangeError = SlippageError::InsufficientOutput {
            quoted: 90,
            minimum: 91,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "slippage: insufficient output amount: quoted 90, minimum 91"
        );
    }
}
