//! Constant-Product Property Tests
//!
//! These properties must hold for every positive input and reserve pair,
//! regardless of specific market conditions.

use amm::{get_amounts_out, V2Math};
use primitive_types::U256;
use proptest::prelude::*;
use std::collections::HashMap;
use types::{PairKey, Reserves, TokenAddress};

prop_compose! {
    fn valid_reserve()
        (reserve in 1u128..1_000_000_000_000_000_000_000_000u128) -> u128 {
        reserve
    }
}

prop_compose! {
    fn valid_amount()
        (amount in 1u128..1_000_000_000_000_000_000_000u128) -> u128 {
        amount
    }
}

fn three_hop_table(reserves: &[(u128, u128)]) -> (Vec<TokenAddress>, HashMap<PairKey, Reserves>) {
    let path: Vec<TokenAddress> = (1u8..=reserves.len() as u8 + 1)
        .map(|b| TokenAddress([b; 20]))
        .collect();
    let table = path
        .windows(2)
        .zip(reserves)
        .map(|(hop, &(reserve_in, reserve_out))| {
            // Tokens are ascending along the path, so hop[0] is always token0
            (PairKey::new(hop[0], hop[1]).unwrap(), Reserves::new(reserve_in, reserve_out))
        })
        .collect();
    (path, table)
}

proptest! {
    #[test]
    fn output_is_strictly_below_reserve(
        amount_in in valid_amount(),
        reserve_in in valid_reserve(),
        reserve_out in valid_reserve(),
    ) {
        let amount_out = V2Math::get_amount_out(amount_in, reserve_in, reserve_out).unwrap();
        prop_assert!(amount_out < reserve_out);
    }

    #[test]
    fn product_never_decreases(
        amount_in in valid_amount(),
        reserve_in in valid_reserve(),
        reserve_out in valid_reserve(),
    ) {
        let amount_out = V2Math::get_amount_out(amount_in, reserve_in, reserve_out).unwrap();

        let k_before = U256::from(reserve_in) * U256::from(reserve_out);
        let k_after = U256::from(reserve_in + amount_in) * U256::from(reserve_out - amount_out);
        prop_assert!(k_after >= k_before);
    }

    #[test]
    fn amount_in_always_suffices(
        reserve_in in valid_reserve(),
        reserve_out in 2u128..1_000_000_000_000_000_000_000_000u128,
        fraction in 1u128..1000u128,
    ) {
        let amount_out = (reserve_out * fraction / 1000).max(1).min(reserve_out - 1);
        let amount_in = V2Math::get_amount_in(amount_out, reserve_in, reserve_out).unwrap();
        prop_assert!(V2Math::get_amount_out(amount_in, reserve_in, reserve_out).unwrap() >= amount_out);
    }

    #[test]
    fn path_output_is_monotonic_in_input(
        smaller in valid_amount(),
        extra in 0u128..1_000_000_000_000u128,
        reserves in prop::collection::vec((valid_reserve(), valid_reserve()), 1..4),
    ) {
        let (path, table) = three_hop_table(&reserves);
        let low = get_amounts_out(&table, smaller, &path);
        let high = get_amounts_out(&table, smaller + extra, &path);

        // A hop can round to zero output, which makes the next hop reject it;
        // only compare quotes that both succeeded
        if let (Ok(low), Ok(high)) = (low, high) {
            prop_assert!(high.last().unwrap() >= low.last().unwrap());
        }
    }
}

#[test]
fn concrete_case_from_equal_reserves() {
    assert_eq!(V2Math::get_amount_out(100, 1000, 1000).unwrap(), 90);
}
