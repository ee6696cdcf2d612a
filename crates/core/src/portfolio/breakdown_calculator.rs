//! Value-weighted aggregation of holdings across a taxonomy.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::breakdown_model::{BucketAllocation, Breakdown};
use super::holdings_model::Holding;
use crate::errors::AggregationError;
use crate::securities::SecurityAllocation;
use crate::taxonomies::TaxonomyKind;

const ONE_HUNDRED: Decimal = dec!(100);
const EXPENSE_RATIO: &str = "Expense Ratio";

/// Joins holdings with allocation data on symbol and sums
/// `market_value * weight / 100` per bucket.
///
/// Held symbols without allocation data are left out of every total and
/// listed in `excluded_symbols`. A zero weighted total is an error since the
/// percentages are undefined, and so is a total that does not fit in a
/// `Decimal`.
pub(crate) fn calculate_breakdown(
    kind: TaxonomyKind,
    holdings: &BTreeMap<String, Holding>,
    allocations: &BTreeMap<String, Arc<SecurityAllocation>>,
) -> Result<Breakdown, AggregationError> {
    let buckets = kind.buckets();
    let mut bucket_totals = vec![Decimal::ZERO; buckets.len()];
    let mut excluded_symbols = Vec::new();

    for (symbol, holding) in holdings {
        let Some(allocation) = allocations.get(symbol) else {
            excluded_symbols.push(symbol.clone());
            continue;
        };

        let market_value = holding.market_value().map_err(|_| overflow(kind.name()))?;
        for (total, weight) in bucket_totals.iter_mut().zip(allocation.weights(kind)) {
            // weight / 100 as a two-place decimal
            *total = market_value
                .checked_mul(Decimal::new(i64::from(weight), 2))
                .and_then(|share| total.checked_add(share))
                .ok_or_else(|| overflow(kind.name()))?;
        }
    }

    if !excluded_symbols.is_empty() {
        debug!(
            "{} breakdown excludes {} symbols without allocation data: {:?}",
            kind.name(),
            excluded_symbols.len(),
            excluded_symbols
        );
    }

    let grand_total = bucket_totals
        .iter()
        .try_fold(Decimal::ZERO, |acc, total| acc.checked_add(*total))
        .ok_or_else(|| overflow(kind.name()))?;
    if grand_total.is_zero() {
        return Err(AggregationError::EmptyTotal {
            measure: kind.name().to_string(),
        });
    }

    let rows = buckets
        .iter()
        .zip(bucket_totals)
        .map(|(bucket, total)| BucketAllocation {
            key: bucket.key.to_string(),
            label: bucket.label.to_string(),
            value: total.round_dp(2),
            percentage: (total / grand_total * ONE_HUNDRED).round_dp(2),
        })
        .collect();

    Ok(Breakdown {
        taxonomy: kind,
        taxonomy_name: kind.name().to_string(),
        buckets: rows,
        total_value: grand_total.round_dp(2),
        excluded_symbols,
    })
}

/// Value-weighted average expense ratio over `portfolio_value`.
///
/// Holdings without allocation data add nothing to the numerator; allocations
/// without an expense ratio count as zero.
pub(crate) fn calculate_expense_ratio(
    holdings: &BTreeMap<String, Holding>,
    allocations: &BTreeMap<String, Arc<SecurityAllocation>>,
    portfolio_value: Decimal,
) -> Result<Decimal, AggregationError> {
    if portfolio_value.is_zero() {
        return Err(AggregationError::EmptyTotal {
            measure: EXPENSE_RATIO.to_string(),
        });
    }

    let mut weighted_cost = Decimal::ZERO;
    for (symbol, holding) in holdings {
        let Some(allocation) = allocations.get(symbol) else {
            continue;
        };
        weighted_cost = holding
            .market_value()
            .ok()
            .and_then(|value| value.checked_mul(allocation.expense_ratio().unwrap_or_default()))
            .and_then(|cost| weighted_cost.checked_add(cost))
            .ok_or_else(|| overflow(EXPENSE_RATIO))?;
    }

    weighted_cost
        .checked_div(portfolio_value)
        .ok_or_else(|| overflow(EXPENSE_RATIO))
}

fn overflow(measure: &str) -> AggregationError {
    AggregationError::Overflow {
        measure: measure.to_string(),
    }
}
