//! Settlement plans and scopes
//!
//! A [`SettlementPlan`] is fixed at quote time: for every hop it records the
//! pair, the canonical `(amount0_out, amount1_out)` and where the output
//! goes (the next pair's custody account, or the final destination). Settle
//! replays it without recomputing anything.
//!
//! A [`SettlementScope`] holds the operation locks of every touched pair and
//! checkpoints of both the reserves and the collaborator journal. Dropping a
//! scope without [`SettlementScope::commit`] rolls both back.

use crate::collaborators::{Journal, PairContract};
use exchange_state::{PairLockSet, ReserveCheckpoint, ReserveStore};
use tracing::{debug, warn};
use types::{Address, ExchangeResult, PairAddress, PairRecord, TokenAddress};

/// One hop of a settlement plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedHop {
    pub pair: PairRecord,
    pub token_in: TokenAddress,
    pub token_out: TokenAddress,
    pub amount_in: u128,
    pub amount0_out: u128,
    pub amount1_out: u128,
    pub destination: Address,
}

/// Per-hop settlement instructions for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    hops: Vec<PlannedHop>,
}

impl SettlementPlan {
    /// Chain `pairs` along `path` using quoted `amounts`
    ///
    /// `pairs[i]` settles `path[i] -> path[i + 1]`; `amounts` has one entry
    /// per path token. The last hop pays `final_destination`.
    pub fn build(
        pairs: &[PairRecord],
        path: &[TokenAddress],
        amounts: &[u128],
        final_destination: Address,
    ) -> Self {
        debug_assert_eq!(pairs.len() + 1, path.len());
        debug_assert_eq!(amounts.len(), path.len());

        let hops = pairs
            .iter()
            .enumerate()
            .map(|(hop, pair)| {
                let token_out = path[hop + 1];
                let (amount0_out, amount1_out) = pair.amounts_out(token_out, amounts[hop + 1]);
                let destination = pairs
                    .get(hop + 1)
                    .map(|next| next.address.account())
                    .unwrap_or(final_destination);

                PlannedHop {
                    pair: *pair,
                    token_in: path[hop],
                    token_out,
                    amount_in: amounts[hop],
                    amount0_out,
                    amount1_out,
                    destination,
                }
            })
            .collect();

        Self { hops }
    }

    pub fn hops(&self) -> &[PlannedHop] {
        &self.hops
    }

    /// Custody account that receives the path input
    pub fn entry_account(&self) -> Option<Address> {
        self.hops.first().map(|hop| hop.pair.address.account())
    }

    pub fn pair_addresses(&self) -> Vec<PairAddress> {
        self.hops.iter().map(|hop| hop.pair.address).collect()
    }

    /// Run every hop in order against `pairs`
    pub fn execute<P: PairContract>(&self, pairs: &P, reserves: &ReserveStore, request_id: u64) -> ExchangeResult<()> {
        for (index, hop) in self.hops.iter().enumerate() {
            debug!(
                request_id,
                hop = index,
                pair = %hop.pair.address,
                amount0_out = hop.amount0_out,
                amount1_out = hop.amount1_out,
                destination = %hop.destination,
                "settling hop"
            );
            pairs.swap(reserves, &hop.pair, hop.amount0_out, hop.amount1_out, hop.destination)?;
        }
        Ok(())
    }
}

/// Exclusive access to a set of pairs with rollback on drop
pub struct SettlementScope<'a, J: Journal> {
    reserves: &'a ReserveStore,
    journal: &'a J,
    reserve_checkpoint: ReserveCheckpoint,
    journal_checkpoint: Option<J::Checkpoint>,
    // Declared last so locks are released after any rollback
    locks: PairLockSet,
}

impl<'a, J: Journal> SettlementScope<'a, J> {
    /// Lock `pairs` in address order, then checkpoint
    pub fn open(reserves: &'a ReserveStore, journal: &'a J, pairs: &[PairAddress]) -> Self {
        let locks = reserves.lock_pairs(pairs);
        let reserve_checkpoint = reserves.checkpoint(locks.pairs());
        let journal_checkpoint = Some(journal.checkpoint());

        Self {
            reserves,
            journal,
            reserve_checkpoint,
            journal_checkpoint,
            locks,
        }
    }

    pub fn locks(&self) -> &PairLockSet {
        &self.locks
    }

    /// Keep every change made inside the scope
    pub fn commit(mut self) {
        if let Some(checkpoint) = self.journal_checkpoint.take() {
            self.journal.commit(checkpoint);
        }
    }
}

impl<J: Journal> Drop for SettlementScope<'_, J> {
    fn drop(&mut self) {
        if let Some(checkpoint) = self.journal_checkpoint.take() {
            self.journal.rollback(checkpoint);
            self.reserves.restore_checkpoint(&self.reserve_checkpoint);
            warn!(pairs = self.locks.pairs().len(), "settlement rolled back");
        }
    }
}
