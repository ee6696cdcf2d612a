//! Traits and identifiers shared by every allocation taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;
use crate::securities::SecurityAllocation;

use super::{
    EconomicStatusAllocation, FundAssetAllocation, GrowthValueAllocation, MarketCapAllocation,
    RegionAllocation, SectorAllocation, UsInternationalAllocation,
};

/// A named percentage bucket within a taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Stable machine key (e.g. "north_america")
    pub key: &'static str,
    /// Human label used by presentation layers (e.g. "North America")
    pub label: &'static str,
}

/// Builds the flattened serialization key for a bucket: `{prefix}_{bucket}_pct`.
pub fn flat_key(prefix: &str, bucket: &str) -> String {
    format!("{}_{}_pct", prefix, bucket)
}

/// Identifies one classification scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaxonomyKind {
    AssetClass,
    MarketCap,
    UsInternational,
    Region,
    GrowthValue,
    EconomicStatus,
    Sector,
}

impl TaxonomyKind {
    /// Every taxonomy, in report order.
    pub const ALL: [TaxonomyKind; 7] = [
        TaxonomyKind::UsInternational,
        TaxonomyKind::Region,
        TaxonomyKind::EconomicStatus,
        TaxonomyKind::GrowthValue,
        TaxonomyKind::MarketCap,
        TaxonomyKind::Sector,
        TaxonomyKind::AssetClass,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TaxonomyKind::AssetClass => "Asset Class",
            TaxonomyKind::MarketCap => "Market Cap",
            TaxonomyKind::UsInternational => "US / International",
            TaxonomyKind::Region => "Region",
            TaxonomyKind::GrowthValue => "Growth / Value",
            TaxonomyKind::EconomicStatus => "Economic Status",
            TaxonomyKind::Sector => "Sector",
        }
    }

    pub fn key_prefix(&self) -> &'static str {
        match self {
            TaxonomyKind::AssetClass => FundAssetAllocation::KEY_PREFIX,
            TaxonomyKind::MarketCap => MarketCapAllocation::KEY_PREFIX,
            TaxonomyKind::UsInternational => UsInternationalAllocation::KEY_PREFIX,
            TaxonomyKind::Region => RegionAllocation::KEY_PREFIX,
            TaxonomyKind::GrowthValue => GrowthValueAllocation::KEY_PREFIX,
            TaxonomyKind::EconomicStatus => EconomicStatusAllocation::KEY_PREFIX,
            TaxonomyKind::Sector => SectorAllocation::KEY_PREFIX,
        }
    }

    pub fn buckets(&self) -> &'static [Bucket] {
        match self {
            TaxonomyKind::AssetClass => FundAssetAllocation::BUCKETS,
            TaxonomyKind::MarketCap => MarketCapAllocation::BUCKETS,
            TaxonomyKind::UsInternational => UsInternationalAllocation::BUCKETS,
            TaxonomyKind::Region => RegionAllocation::BUCKETS,
            TaxonomyKind::GrowthValue => GrowthValueAllocation::BUCKETS,
            TaxonomyKind::EconomicStatus => EconomicStatusAllocation::BUCKETS,
            TaxonomyKind::Sector => SectorAllocation::BUCKETS,
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed set of integer percentage buckets that must sum to exactly 100.
///
/// Implementations are generated by the `taxonomy!` macro; bucket order in
/// [`Taxonomy::BUCKETS`] is the order breakdown rows are reported in.
pub trait Taxonomy: Sized + Copy + Default + fmt::Debug + Send + Sync + 'static {
    const KIND: TaxonomyKind;
    /// Prefix used for flattened keys, stable across releases.
    const KEY_PREFIX: &'static str;
    const BUCKETS: &'static [Bucket];

    /// Bucket weights in declared order.
    fn weights(&self) -> Vec<u8>;

    /// Builds and validates an instance from weights in declared order.
    fn from_weights(weights: &[u8]) -> Result<Self, ValidationError>;

    /// Selects this taxonomy from an allocation record.
    fn of(allocation: &SecurityAllocation) -> &Self;

    fn validate(&self) -> Result<(), ValidationError> {
        validate_weights(Self::KEY_PREFIX, Self::BUCKETS, &self.weights())
    }

    /// Weight of a bucket by key, `None` for unknown keys.
    fn weight(&self, bucket: &str) -> Option<u8> {
        Self::BUCKETS
            .iter()
            .position(|b| b.key == bucket)
            .and_then(|idx| self.weights().get(idx).copied())
    }

    fn flattened_keys() -> Vec<String> {
        Self::BUCKETS
            .iter()
            .map(|b| flat_key(Self::KEY_PREFIX, b.key))
            .collect()
    }

    fn labels() -> Vec<&'static str> {
        Self::BUCKETS.iter().map(|b| b.label).collect()
    }

    fn keys_labels() -> (Vec<String>, Vec<&'static str>) {
        (Self::flattened_keys(), Self::labels())
    }

    /// Flattened `(key, weight)` pairs in declared order.
    fn to_flat(&self) -> Vec<(String, u8)> {
        Self::flattened_keys()
            .into_iter()
            .zip(self.weights())
            .collect()
    }
}

/// Checks the range and sum rules for a set of weights.
pub(crate) fn validate_weights(
    taxonomy: &'static str,
    buckets: &'static [Bucket],
    weights: &[u8],
) -> Result<(), ValidationError> {
    if weights.len() != buckets.len() {
        return Err(ValidationError::WeightCountMismatch {
            taxonomy,
            expected: buckets.len(),
            actual: weights.len(),
        });
    }

    for (bucket, &value) in buckets.iter().zip(weights) {
        if value > 100 {
            return Err(ValidationError::BucketOutOfRange {
                taxonomy,
                bucket: bucket.key,
                value,
            });
        }
    }

    let sum: u16 = weights.iter().map(|&w| u16::from(w)).sum();
    if sum != 100 {
        return Err(ValidationError::BucketSumMismatch { taxonomy, sum });
    }

    Ok(())
}
