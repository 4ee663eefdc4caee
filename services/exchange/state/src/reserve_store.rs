//! Reserve Store
//!
//! Owns the reserves of every pair. Each pair slot carries two locks:
//!
//! - a reserve `RwLock`, held only for the duration of a single read or write
//! - an operation mutex, held by the engine across quote and settlement
//!
//! Operation locks are always taken in ascending pair-address order so two
//! settlements touching overlapping pairs cannot deadlock.

use crate::traits::{StateError, Stateful};
use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use types::{PairAddress, Reserves};

/// Storage for a single pair
#[derive(Debug, Default)]
struct PairSlot {
    reserves: RwLock<Reserves>,
    op_lock: Arc<Mutex<()>>,
}

/// Reserve state for all pairs
///
/// Passed explicitly by reference into every engine call; there is no
/// process-wide instance.
#[derive(Debug, Default)]
pub struct ReserveStore {
    /// Slots are never removed once created, so operation locks stay stable
    slots: DashMap<PairAddress, Arc<PairSlot>>,

    stats: RwLock<StoreStats>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_pairs: usize,
    pub funded_pairs: usize,
    pub reserve_writes: u64,
    pub rollbacks: u64,
}

/// Exclusive operation locks over a set of pairs, released on drop
pub struct PairLockSet {
    pairs: Vec<PairAddress>,
    _guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl PairLockSet {
    /// Locked pairs in acquisition (ascending) order
    pub fn pairs(&self) -> &[PairAddress] {
        &self.pairs
    }

    pub fn holds(&self, pair: PairAddress) -> bool {
        self.pairs.binary_search(&pair).is_ok()
    }
}

impl std::fmt::Debug for PairLockSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairLockSet").field("pairs", &self.pairs).finish()
    }
}

/// Reserves of a set of pairs captured before a settlement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveCheckpoint {
    entries: Vec<(PairAddress, Reserves)>,
}

impl ReserveCheckpoint {
    pub fn reserves(&self, pair: PairAddress) -> Option<Reserves> {
        self.entries
            .iter()
            .find(|(address, _)| *address == pair)
            .map(|(_, reserves)| *reserves)
    }
}

#[derive(Serialize, Deserialize)]
struct StoreSnapshot {
    pairs: Vec<(PairAddress, Reserves)>,
}

impl ReserveStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, pair: PairAddress) -> Arc<PairSlot> {
        // Clone the Arc out so no shard lock is held past this call
        self.slots
            .entry(pair)
            .or_insert_with(|| {
                debug!(pair = %pair, "allocated reserve slot");
                Arc::new(PairSlot::default())
            })
            .value()
            .clone()
    }

    /// Zero-initialize the slot for `pair`; existing reserves are untouched
    pub fn ensure_pair(&self, pair: PairAddress) {
        self.slot(pair);
    }

    pub fn contains(&self, pair: PairAddress) -> bool {
        self.slots.contains_key(&pair)
    }

    /// Current reserves; an unknown pair reads as empty
    pub fn reserves(&self, pair: PairAddress) -> Reserves {
        match self.slots.get(&pair) {
            Some(slot) => *slot.reserves.read(),
            None => Reserves::EMPTY,
        }
    }

    pub fn set_reserves(&self, pair: PairAddress, reserves: Reserves) {
        let slot = self.slot(pair);
        *slot.reserves.write() = reserves;
        self.stats.write().reserve_writes += 1;
        debug!(
            pair = %pair,
            reserve0 = reserves.reserve0,
            reserve1 = reserves.reserve1,
            "reserves updated"
        );
    }

    /// Take the operation lock of every pair in `pairs`
    ///
    /// Duplicates are collapsed and locks are acquired in ascending address
    /// order. Blocks until all locks are held.
    pub fn lock_pairs(&self, pairs: &[PairAddress]) -> PairLockSet {
        let mut ordered = pairs.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let guards = ordered
            .iter()
            .map(|pair| {
                let op_lock = self.slot(*pair).op_lock.clone();
                op_lock.lock_arc()
            })
            .collect();

        debug!(pairs = ordered.len(), "pair locks acquired");
        PairLockSet {
            pairs: ordered,
            _guards: guards,
        }
    }

    /// Capture the reserves of `pairs`
    pub fn checkpoint(&self, pairs: &[PairAddress]) -> ReserveCheckpoint {
        ReserveCheckpoint {
            entries: pairs.iter().map(|pair| (*pair, self.reserves(*pair))).collect(),
        }
    }

    /// Put back every reserve captured in `checkpoint`
    pub fn restore_checkpoint(&self, checkpoint: &ReserveCheckpoint) {
        for (pair, reserves) in &checkpoint.entries {
            *self.slot(*pair).reserves.write() = *reserves;
        }
        self.stats.write().rollbacks += 1;
        debug!(pairs = checkpoint.entries.len(), "reserves rolled back");
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.read().clone();
        stats.total_pairs = self.slots.len();
        stats.funded_pairs = self
            .slots
            .iter()
            .filter(|entry| !entry.value().reserves.read().is_empty())
            .count();
        stats
    }
}

impl Stateful for ReserveStore {
    fn snapshot(&self) -> Result<Vec<u8>, StateError> {
        let mut pairs: Vec<(PairAddress, Reserves)> = self
            .slots
            .iter()
            .map(|entry| (*entry.key(), *entry.value().reserves.read()))
            .collect();
        pairs.sort_unstable_by_key(|(pair, _)| *pair);

        Ok(bincode::serialize(&StoreSnapshot { pairs })?)
    }

    fn restore(&self, snapshot: &[u8]) -> Result<(), StateError> {
        let snapshot: StoreSnapshot = bincode::deserialize(snapshot)?;

        // Existing slots keep their operation locks; pairs absent from the
        // snapshot are zeroed rather than removed
        for entry in self.slots.iter() {
            *entry.value().reserves.write() = Reserves::EMPTY;
        }
        for (pair, reserves) in &snapshot.pairs {
            *self.slot(*pair).reserves.write() = *reserves;
        }

        info!("Reserve store restored: {} pairs", snapshot.pairs.len());
        Ok(())
    }
}
