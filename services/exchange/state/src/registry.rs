//! Pair Registry
//!
//! Maps canonical token pairs to their derived pair addresses and keeps the
//! creation order. Creation is idempotent: racing callers for the same
//! unordered pair all observe one record.

use crate::reserve_store::ReserveStore;
use crate::traits::{StateError, Stateful};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::{ExchangeResult, PairAddress, PairKey, PairRecord, TokenAddress};

/// All pairs known to the exchange
#[derive(Debug, Default)]
pub struct PairRegistry {
    by_key: DashMap<PairKey, PairRecord>,
    by_address: DashMap<PairAddress, PairRecord>,

    /// Creation order, for listing
    ordered: RwLock<Vec<PairRecord>>,
}

#[derive(Serialize, Deserialize)]
struct RegistrySnapshot {
    pairs: Vec<PairRecord>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the pair for `(token_a, token_b)`, creating it if absent
    ///
    /// A new pair starts with a zero-initialized reserve slot in `reserves`.
    /// Existing reserves are never touched.
    pub fn get_or_create(
        &self,
        reserves: &ReserveStore,
        token_a: TokenAddress,
        token_b: TokenAddress,
    ) -> ExchangeResult<PairRecord> {
        let key = PairKey::new(token_a, token_b)?;

        if let Some(record) = self.by_key.get(&key) {
            return Ok(*record);
        }

        let record = *self.by_key.entry(key).or_insert_with(|| {
            let record = PairRecord::new(key);
            reserves.ensure_pair(record.address);
            self.by_address.insert(record.address, record);

            let mut ordered = self.ordered.write();
            ordered.push(record);
            info!(
                "Pair created: {} pair={} total_pairs={}",
                key,
                record.address,
                ordered.len()
            );
            record
        });

        Ok(record)
    }

    /// Look up a pair without creating it
    pub fn get(&self, token_a: TokenAddress, token_b: TokenAddress) -> Option<PairRecord> {
        let key = PairKey::new(token_a, token_b).ok()?;
        self.get_by_key(&key)
    }

    pub fn get_by_key(&self, key: &PairKey) -> Option<PairRecord> {
        self.by_key.get(key).map(|record| *record)
    }

    pub fn get_by_address(&self, pair: PairAddress) -> Option<PairRecord> {
        self.by_address.get(&pair).map(|record| *record)
    }

    /// Every pair in creation order
    pub fn pairs(&self) -> Vec<PairRecord> {
        self.ordered.read().clone()
    }

    pub fn len(&self) -> usize {
        self.ordered.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Stateful for PairRegistry {
    fn snapshot(&self) -> Result<Vec<u8>, StateError> {
        Ok(bincode::serialize(&RegistrySnapshot {
            pairs: self.pairs(),
        })?)
    }

    fn restore(&self, snapshot: &[u8]) -> Result<(), StateError> {
        let snapshot: RegistrySnapshot = bincode::deserialize(snapshot)?;

        if let Some(record) = snapshot
            .pairs
            .iter()
            .find(|record| record.key.pair_address() != record.address)
        {
            return Err(StateError::InvalidSnapshot {
                reason: format!("pair {} does not match its tokens {}", record.address, record.key),
            });
        }

        self.by_key.clear();
        self.by_address.clear();
        for record in &snapshot.pairs {
            self.by_key.insert(record.key, *record);
            self.by_address.insert(record.address, *record);
        }

        info!("Pair registry restored: {} pairs", snapshot.pairs.len());
        *self.ordered.write() = snapshot.pairs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use types::{ExchangeError, Reserves, ValidationError};

    fn token(byte: u8) -> TokenAddress {
        TokenAddress([byte; 20])
    }

    #[test]
    fn test_get_or_create_is_order_independent() {
        let registry = PairRegistry::new();
        let store = ReserveStore::new();

        let first = registry.get_or_create(&store, token(1), token(2)).unwrap();
        let second = registry.get_or_create(&store, token(2), token(1)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.token0(), token(1));
        assert_eq!(registry.len(), 1);
        assert!(store.contains(first.address));
        assert_eq!(store.reserves(first.address), Reserves::EMPTY);
    }

    #[test]
    fn test_invalid_pairs_rejected() {
        let registry = PairRegistry::new();
        let store = ReserveStore::new();

        assert_eq!(
            registry.get_or_create(&store, token(1), token(1)).unwrap_err(),
            ExchangeError::Validation(ValidationError::IdenticalTokens { token: token(1) })
        );
        assert_eq!(
            registry
                .get_or_create(&store, TokenAddress::ZERO, token(1))
                .unwrap_err(),
            ExchangeError::Validation(ValidationError::ZeroAddress)
        );
        assert!(registry.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_existing_reserves_untouched() {
        let registry = PairRegistry::new();
        let store = ReserveStore::new();

        let record = registry.get_or_create(&store, token(1), token(2)).unwrap();
        store.set_reserves(record.address, Reserves::new(10, 20));
        registry.get_or_create(&store, token(2), token(1)).unwrap();

        assert_eq!(store.reserves(record.address), Reserves::new(10, 20));
    }

    #[test]
    fn test_lookup_and_listing() {
        let registry = PairRegistry::new();
        let store = ReserveStore::new();

        assert!(registry.get(token(1), token(2)).is_none());
        let first = registry.get_or_create(&store, token(1), token(2)).unwrap();
        let second = registry.get_or_create(&store, token(3), token(2)).unwrap();

        assert_eq!(registry.get(token(2), token(1)), Some(first));
        assert_eq!(registry.get_by_address(second.address), Some(second));
        assert_eq!(registry.pairs(), vec![first, second]);
    }

    #[test]
    fn test_concurrent_creation_yields_one_pair() {
        let registry = Arc::new(PairRegistry::new());
        let store = Arc::new(ReserveStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = registry.clone();
                let store = store.clone();
                thread::spawn(move || {
                    let (a, b) = if i % 2 == 0 {
                        (token(7), token(9))
                    } else {
                        (token(9), token(7))
                    };
                    registry.get_or_create(&store, a, b).unwrap().address
                })
            })
            .collect();

        let addresses: Vec<PairAddress> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let registry = PairRegistry::new();
        let store = ReserveStore::new();
        registry.get_or_create(&store, token(1), token(2)).unwrap();
        registry.get_or_create(&store, token(1), token(3)).unwrap();

        let snapshot = registry.snapshot().unwrap();
        let restored = PairRegistry::new();
        restored.restore(&snapshot).unwrap();

        assert_eq!(restored.pairs(), registry.pairs());
        assert!(restored.get(token(3), token(1)).is_some());
    }
}
