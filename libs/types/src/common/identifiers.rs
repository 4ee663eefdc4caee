//! # Typed Identifiers for the Exchange Core
//!
//! Zero-cost wrappers around 20-byte identifiers so that accounts, tokens and
//! pairs can never be confused at a call site:
//!
//! ```rust
//! use types::{Address, TokenAddress, PairKey};
//!
//! let usdc = TokenAddress::from_hex("0x2791bca1f2de4661ed88a30c99a7a9449aa84174").unwrap();
//! let weth = TokenAddress::from_hex("0x7ceb23fd6bc0add59e62ac25578270cff1b9f619").unwrap();
//!
//! // Canonical ordering is independent of argument order
//! let key = PairKey::new(weth, usdc).unwrap();
//! assert_eq!(key, PairKey::new(usdc, weth).unwrap());
//! assert_eq!(key.token0, usdc);
//!
//! // Pair addresses are derived, never allocated
//! assert_eq!(key.pair_address(), PairKey::new(usdc, weth).unwrap().pair_address());
//! # let _ = Address::ZERO;
//! ```

use crate::common::errors::ValidationError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Macro for generating zero-cost typed wrappers around 20-byte identifiers
///
/// Each wrapper gets hex parsing, `0x`-prefixed display, ordering by raw
/// bytes and transparent serde support.
macro_rules! define_typed_address {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Default
        )]
        #[repr(transparent)]
        pub struct $name(pub [u8; 20]);

        impl $name {
            /// The all-zero identifier, never a valid participant
            pub const ZERO: Self = Self([0u8; 20]);

            /// Create a new typed wrapper
            #[inline(always)]
            pub const fn new(inner: [u8; 20]) -> Self {
                Self(inner)
            }

            /// Extract the inner bytes by value
            #[inline(always)]
            pub const fn into_inner(self) -> [u8; 20] {
                self.0
            }

            #[inline(always)]
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            #[inline(always)]
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 20]
            }

            /// Parse from a hex string with or without `0x` prefix
            pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
                let trimmed = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(trimmed).map_err(|_| ValidationError::InvalidAddress {
                    input: s.to_string(),
                })?;
                let array: [u8; 20] = bytes.try_into().map_err(|_| ValidationError::InvalidAddress {
                    input: s.to_string(),
                })?;
                Ok(Self(array))
            }

            /// Short form for log lines: first four bytes
            pub fn short(&self) -> String {
                format!("0x{}…", hex::encode(&self.0[..4]))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; 20]> for $name {
            #[inline(always)]
            fn from(inner: [u8; 20]) -> Self {
                Self(inner)
            }
        }

        impl From<$name> for [u8; 20] {
            #[inline(always)]
            fn from(wrapper: $name) -> [u8; 20] {
                wrapper.0
            }
        }

        impl AsRef<[u8; 20]> for $name {
            #[inline(always)]
            fn as_ref(&self) -> &[u8; 20] {
                &self.0
            }
        }

        // Serialized as a 0x-prefixed hex string so snapshots and config stay readable
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_typed_address!(
    /// Account address (20 bytes)
    ///
    /// Users, the engine's own account and pair custody accounts all share
    /// this type; pair custody accounts are obtained via [`PairAddress::account`].
    Address
);

define_typed_address!(
    /// Token contract address (20 bytes)
    ///
    /// The total order on token addresses is plain byte order and decides
    /// which token becomes `token0` of a pair.
    TokenAddress
);

define_typed_address!(
    /// Pair identifier (20 bytes)
    ///
    /// Derived from the canonical token pair, so every caller computing the
    /// address for the same unordered pair gets the same value.
    PairAddress
);

impl PairAddress {
    /// The account holding this pair's custody balances
    #[inline(always)]
    pub fn account(&self) -> Address {
        Address(self.0)
    }

    /// A pair's liquidity credit is tracked as a token at the pair's own address
    #[inline(always)]
    pub fn liquidity_token(&self) -> TokenAddress {
        TokenAddress(self.0)
    }
}

/// Token identity plus display precision
///
/// `decimals` is only used when formatting amounts for humans; all core
/// arithmetic runs on raw smallest-unit integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: TokenAddress,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: TokenAddress, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Canonical unordered token pair: `token0 < token1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub token0: TokenAddress,
    pub token1: TokenAddress,
}

impl PairKey {
    /// Canonicalize an unordered pair of tokens
    pub fn new(token_a: TokenAddress, token_b: TokenAddress) -> Result<Self, ValidationError> {
        if token_a == token_b {
            return Err(ValidationError::IdenticalTokens { token: token_a });
        }
        if token_a.is_zero() || token_b.is_zero() {
            return Err(ValidationError::ZeroAddress);
        }
        let (token0, token1) = sort_tokens(token_a, token_b);
        Ok(Self { token0, token1 })
    }

    /// Deterministic pair address: last 20 bytes of `keccak256(token0 ‖ token1)`
    pub fn pair_address(&self) -> PairAddress {
        let mut hasher = Keccak256::new();
        hasher.update(self.token0.as_bytes());
        hasher.update(self.token1.as_bytes());
        let digest = hasher.finalize();

        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);
        PairAddress(address)
    }

    /// True when `token` is this pair's `token0`
    pub fn is_token0(&self, token: TokenAddress) -> bool {
        self.token0 == token
    }

    pub fn contains(&self, token: TokenAddress) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// The other side of the pair
    pub fn counterpart(&self, token: TokenAddress) -> Option<TokenAddress> {
        if token == self.token0 {
            Some(self.token1)
        } else if token == self.token1 {
            Some(self.token0)
        } else {
            None
        }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.token0.short(), self.token1.short())
    }
}

/// Order two tokens by the canonical total order
#[inline]
pub fn sort_tokens(token_a: TokenAddress, token_b: TokenAddress) -> (TokenAddress, TokenAddress) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}
