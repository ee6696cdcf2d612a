//! Concrete allocation taxonomies.

use serde::{Deserialize, Serialize};

use super::taxonomy_traits::{Bucket, Taxonomy, TaxonomyKind};
use crate::errors::ValidationError;
use crate::securities::SecurityAllocation;

/// Declares a taxonomy struct with one `u8` field per bucket and implements
/// [`Taxonomy`] for it. Bucket order is the order of declaration.
macro_rules! taxonomy {
    (
        $(#[$meta:meta])*
        $name:ident {
            kind: $kind:ident,
            prefix: $prefix:literal,
            field: $field:ident,
            buckets: { $( $bucket:ident => $label:literal ),+ $(,)? } $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $( pub $bucket: u8, )+
        }

        impl $name {
            /// Builds a validated instance; weights must sum to exactly 100.
            #[allow(clippy::too_many_arguments)]
            pub fn try_new($( $bucket: u8 ),+) -> Result<Self, ValidationError> {
                let value = Self { $( $bucket ),+ };
                value.validate()?;
                Ok(value)
            }
        }

        impl Taxonomy for $name {
            const KIND: TaxonomyKind = TaxonomyKind::$kind;
            const KEY_PREFIX: &'static str = $prefix;
            const BUCKETS: &'static [Bucket] = &[
                $( Bucket { key: stringify!($bucket), label: $label } ),+
            ];

            fn weights(&self) -> Vec<u8> {
                vec![$( self.$bucket ),+]
            }

            fn from_weights(weights: &[u8]) -> Result<Self, ValidationError> {
                if weights.len() != Self::BUCKETS.len() {
                    return Err(ValidationError::WeightCountMismatch {
                        taxonomy: Self::KEY_PREFIX,
                        expected: Self::BUCKETS.len(),
                        actual: weights.len(),
                    });
                }
                let mut iter = weights.iter().copied();
                let value = Self {
                    $( $bucket: iter.next().unwrap_or_default() ),+
                };
                value.validate()?;
                Ok(value)
            }

            fn of(allocation: &SecurityAllocation) -> &Self {
                &allocation.$field
            }
        }
    };
}

taxonomy! {
    /// Fund composition by asset class.
    FundAssetAllocation {
        kind: AssetClass,
        prefix: "asset_type",
        field: asset_class,
        buckets: {
            stocks => "Stocks",
            bonds => "Bonds",
            real_estate => "Real Estate",
            cash => "Cash",
        },
    }
}

taxonomy! {
    MarketCapAllocation {
        kind: MarketCap,
        prefix: "mc",
        field: market_cap,
        buckets: {
            large_cap => "Large Cap",
            mid_cap => "Mid Cap",
            small_cap => "Small Cap",
        },
    }
}

taxonomy! {
    UsInternationalAllocation {
        kind: UsInternational,
        prefix: "intl",
        field: us_international,
        buckets: {
            us => "US",
            international => "International",
        },
    }
}

taxonomy! {
    /// Geographic region of the underlying issuers.
    RegionAllocation {
        kind: Region,
        prefix: "region",
        field: region,
        buckets: {
            north_america => "North America",
            emea => "Europe & Middle East",
            latam => "Latin America",
            apac => "Asia/Pacific",
            global => "Global",
        },
    }
}

taxonomy! {
    GrowthValueAllocation {
        kind: GrowthValue,
        prefix: "strategy",
        field: growth_value,
        buckets: {
            growth => "Growth",
            value => "Value",
        },
    }
}

taxonomy! {
    EconomicStatusAllocation {
        kind: EconomicStatus,
        prefix: "econ",
        field: economic_status,
        buckets: {
            developed => "Developed Markets",
            emerging => "Emerging Markets",
            frontier => "Frontier Markets",
        },
    }
}

taxonomy! {
    /// GICS sector weights.
    SectorAllocation {
        kind: Sector,
        prefix: "sector",
        field: sector,
        buckets: {
            information_technology => "Information Technology",
            health_care => "Health Care",
            financials => "Financials",
            consumer_discretionary => "Consumer Discretionary",
            energy => "Energy",
            communication_services => "Communication Services",
            consumer_staples => "Consumer Staples",
            industrials => "Industrials",
            materials => "Materials",
            real_estate => "Real Estate",
            utilities => "Utilities",
        },
    }
}
