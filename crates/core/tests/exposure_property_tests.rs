//! Property-based integration tests for taxonomies and breakdowns.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use folioscope_core::portfolio::{Holding, Portfolio};
use folioscope_core::securities::{SecurityAllocation, SecurityInfo, SecurityType};
use folioscope_core::taxonomies::{
    EconomicStatusAllocation, FundAssetAllocation, GrowthValueAllocation, MarketCapAllocation,
    RegionAllocation, SectorAllocation, Taxonomy, TaxonomyKind, UsInternationalAllocation,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

/// Generates `n` integer weights that sum to exactly 100.
fn arb_weights(n: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..=100, n - 1).prop_map(|mut cuts| {
        cuts.sort_unstable();
        let mut weights = Vec::with_capacity(cuts.len() + 1);
        let mut previous = 0u8;
        for cut in cuts {
            weights.push(cut - previous);
            previous = cut;
        }
        weights.push(100 - previous);
        weights
    })
}

fn arb_taxonomy<T: Taxonomy>() -> impl Strategy<Value = T> {
    arb_weights(T::BUCKETS.len()).prop_map(|w| T::from_weights(&w).unwrap())
}

/// Generates a valid allocation with random weights in every taxonomy.
fn arb_allocation(symbol: String) -> impl Strategy<Value = SecurityAllocation> {
    (
        arb_taxonomy::<FundAssetAllocation>(),
        arb_taxonomy::<MarketCapAllocation>(),
        arb_taxonomy::<UsInternationalAllocation>(),
        arb_taxonomy::<RegionAllocation>(),
        arb_taxonomy::<GrowthValueAllocation>(),
        arb_taxonomy::<EconomicStatusAllocation>(),
        arb_taxonomy::<SectorAllocation>(),
        proptest::option::of(0u32..200),
    )
        .prop_map(
            move |(asset, mc, intl, region, strategy, econ, sector, er_bps)| {
                let mut info = SecurityInfo::new(format!("{} Fund", symbol), SecurityType::Etf);
                info.expense_ratio = er_bps.map(|bps| Decimal::new(bps as i64, 2));
                SecurityAllocation::builder(symbol.clone(), info)
                    .asset_class(asset)
                    .market_cap(mc)
                    .us_international(intl)
                    .region(region)
                    .growth_value(strategy)
                    .economic_status(econ)
                    .sector(sector)
                    .build()
                    .unwrap()
            },
        )
}

/// Generates up to eight positions, each optionally paired with allocation data.
fn arb_positions() -> impl Strategy<Value = Vec<(Holding, Option<SecurityAllocation>)>> {
    proptest::collection::vec((0u32..1000, 0u64..100_000, any::<bool>()), 1..8).prop_flat_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (qty, price_cents, known))| {
                    let symbol = format!("SYM{}", i);
                    let holding =
                        Holding::new(symbol.clone(), Decimal::from(qty), Decimal::new(price_cents as i64, 2))
                            .unwrap();
                    let allocation = if known {
                        arb_allocation(symbol).prop_map(Some).boxed()
                    } else {
                        Just(None).boxed()
                    };
                    (Just(holding), allocation)
                })
                .collect::<Vec<_>>()
        },
    )
}

fn build_portfolio(positions: &[(Holding, Option<SecurityAllocation>)]) -> Portfolio {
    let mut portfolio = Portfolio::new("Property", "TEST", None);
    for (holding, allocation) in positions {
        portfolio.add_security(holding.clone()).unwrap();
        if let Some(allocation) = allocation {
            portfolio.add_security_allocation_data(allocation.clone());
        }
    }
    portfolio
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Generated weights always validate, and bumping any bucket breaks the sum.
    #[test]
    fn prop_taxonomy_sum_rule(weights in arb_weights(RegionAllocation::BUCKETS.len()), idx in 0usize..5) {
        prop_assert!(RegionAllocation::from_weights(&weights).is_ok());

        let mut bumped = weights.clone();
        if bumped[idx] < 100 {
            bumped[idx] += 1;
            prop_assert!(RegionAllocation::from_weights(&bumped).is_err());
        }
    }

    /// Flattening and rebuilding an allocation preserves every bucket value.
    #[test]
    fn prop_record_round_trip(allocation in arb_allocation("RT".to_string())) {
        let record = allocation.to_record();
        let restored = SecurityAllocation::from_record(&record).unwrap();
        for kind in TaxonomyKind::ALL {
            prop_assert_eq!(restored.weights(kind), allocation.weights(kind));
        }
        prop_assert_eq!(restored, allocation);
    }

    /// Every breakdown's total equals the market value of the joined holdings,
    /// excluded symbols are exactly the unresolved ones, and total_value()
    /// is unaffected by missing allocation data.
    #[test]
    fn prop_breakdown_totals(positions in arb_positions()) {
        let portfolio = build_portfolio(&positions);

        let joined_value: Decimal = positions
            .iter()
            .filter(|(_, a)| a.is_some())
            .map(|(h, _)| h.market_value().unwrap())
            .sum();
        let holdings_value: Decimal = positions.iter().map(|(h, _)| h.total_value).sum();
        prop_assert_eq!(portfolio.total_value(), holdings_value);

        for kind in TaxonomyKind::ALL {
            match portfolio.breakdown(kind) {
                Ok(breakdown) => {
                    prop_assert_eq!(breakdown.total_value, joined_value.round_dp(2));
                    prop_assert_eq!(&breakdown.excluded_symbols, &portfolio.unresolved_symbols());
                    prop_assert_eq!(breakdown.buckets.len(), kind.buckets().len());

                    let bucket_sum: Decimal = breakdown.buckets.iter().map(|b| b.value).sum();
                    let tolerance = Decimal::new(breakdown.buckets.len() as i64, 2);
                    prop_assert!((bucket_sum - breakdown.total_value).abs() <= tolerance);

                    for bucket in &breakdown.buckets {
                        prop_assert!(bucket.percentage >= Decimal::ZERO);
                        prop_assert!(bucket.percentage <= Decimal::ONE_HUNDRED);
                    }
                    prop_assert!((breakdown.percentage_sum() - Decimal::ONE_HUNDRED).abs() <= tolerance);
                }
                Err(_) => prop_assert!(joined_value.is_zero()),
            }
        }
    }
}
