//! Exposure breakdown models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::taxonomies::TaxonomyKind;

/// Dollar total and share of one bucket within a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAllocation {
    /// Bucket key (e.g. "north_america")
    pub key: String,
    /// Display label (e.g. "North America")
    pub label: String,
    /// Weighted dollar total, rounded to cents
    pub value: Decimal,
    /// Share of the weighted total (0-100), rounded to two decimals.
    /// Rows are not renormalized, so they may not add up to exactly 100.
    pub percentage: Decimal,
}

/// Value-weighted exposure of a portfolio across one taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub taxonomy: TaxonomyKind,
    pub taxonomy_name: String,
    /// One row per bucket in declared order, zero rows included
    pub buckets: Vec<BucketAllocation>,
    /// Sum of the weighted bucket totals, rounded to cents
    pub total_value: Decimal,
    /// Held symbols without allocation data, sorted
    pub excluded_symbols: Vec<String>,
}

impl Breakdown {
    pub fn bucket(&self, key: &str) -> Option<&BucketAllocation> {
        self.buckets.iter().find(|b| b.key == key)
    }

    pub fn by_label(&self, label: &str) -> Option<&BucketAllocation> {
        self.buckets.iter().find(|b| b.label == label)
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded_symbols.len()
    }

    /// Sum of the rounded percentages; may drift from 100 by rounding.
    pub fn percentage_sum(&self) -> Decimal {
        self.buckets.iter().map(|b| b.percentage).sum()
    }
}
