//! Router: shared state for the swap engine and the liquidity manager
//!
//! Swap entrypoints live in [`crate::swap_engine`], liquidity entrypoints in
//! [`crate::liquidity`]. Both borrow a [`exchange_state::MarketView`] per call.

use crate::collaborators::{Clock, Collaborators, SystemClock};
use crate::settlement::SettlementScope;
use exchange_state::ReserveStore;
use std::sync::atomic::{AtomicU64, Ordering};
use torq_config::RouterSettings;
use types::{Address, ExchangeError, ExchangeResult, PairAddress, TokenAddress, ValidationError};

/// Exchange router bound to one set of collaborators
pub struct Router<C, K = SystemClock> {
    pub(crate) collaborators: C,
    pub(crate) clock: K,
    pub(crate) engine: Address,
    pub(crate) wrapped_native: TokenAddress,
    next_request_id: AtomicU64,
}

impl<C: Collaborators, K: Clock> Router<C, K> {
    /// Router configured from `[router]` settings
    pub fn new(settings: &RouterSettings, collaborators: C, clock: K) -> Self {
        Self::with_addresses(settings.engine_address, settings.wrapped_native, collaborators, clock)
    }

    pub fn with_addresses(engine: Address, wrapped_native: TokenAddress, collaborators: C, clock: K) -> Self {
        Self {
            collaborators,
            clock,
            engine,
            wrapped_native,
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn collaborators(&self) -> &C {
        &self.collaborators
    }

    /// The router's own account
    pub fn engine_address(&self) -> Address {
        self.engine
    }

    pub fn wrapped_native(&self) -> TokenAddress {
        self.wrapped_native
    }

    pub(crate) fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn check_deadline(&self, deadline: u64) -> ExchangeResult<()> {
        let now = self.clock.now();
        if deadline < now {
            return Err(ExchangeError::Expired { deadline, now });
        }
        Ok(())
    }

    pub(crate) fn check_recipient(to: Address) -> ExchangeResult<()> {
        if to.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        Ok(())
    }

    pub(crate) fn check_positive(amount: u128, what: &'static str) -> ExchangeResult<()> {
        if amount == 0 {
            return Err(ValidationError::ZeroAmount { what }.into());
        }
        Ok(())
    }

    /// `token` must be the wrapped native token; `position` names the path end
    pub(crate) fn check_wrapped_native(&self, token: TokenAddress, position: &'static str) -> ExchangeResult<()> {
        if token != self.wrapped_native {
            return Err(ValidationError::NotWrappedNative {
                position,
                expected: self.wrapped_native,
                found: token,
            }
            .into());
        }
        Ok(())
    }

    pub(crate) fn open_scope<'a>(&'a self, reserves: &'a ReserveStore, pairs: &[PairAddress]) -> SettlementScope<'a, C> {
        SettlementScope::open(reserves, &self.collaborators, pairs)
    }
}
