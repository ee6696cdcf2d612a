//! Security allocation records and their flattened tabular form.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::taxonomies::{
    EconomicStatusAllocation, FundAssetAllocation, GrowthValueAllocation, MarketCapAllocation,
    RegionAllocation, SectorAllocation, Taxonomy, TaxonomyKind, UsInternationalAllocation,
};

/// Instrument category reported by allocation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityType {
    Stock,
    #[serde(rename = "ETF")]
    Etf,
    MutualFund,
    Bond,
    MoneyMarket,
    Other,
}

impl SecurityType {
    pub const ALL: [SecurityType; 6] = [
        SecurityType::Stock,
        SecurityType::Etf,
        SecurityType::MutualFund,
        SecurityType::Bond,
        SecurityType::MoneyMarket,
        SecurityType::Other,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            SecurityType::Stock => "Stock",
            SecurityType::Etf => "ETF",
            SecurityType::MutualFund => "Mutual Fund",
            SecurityType::Bond => "Bond",
            SecurityType::MoneyMarket => "Money Market",
            SecurityType::Other => "Other",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SecurityType {
    type Err = ValidationError;

    /// Accepts both display names ("Mutual Fund") and wire names ("MUTUAL_FUND").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace([' ', '-'], "_").to_uppercase();
        match normalized.as_str() {
            "STOCK" => Ok(SecurityType::Stock),
            "ETF" => Ok(SecurityType::Etf),
            "MUTUAL_FUND" => Ok(SecurityType::MutualFund),
            "BOND" => Ok(SecurityType::Bond),
            "MONEY_MARKET" => Ok(SecurityType::MoneyMarket),
            "OTHER" => Ok(SecurityType::Other),
            _ => Err(ValidationError::InvalidInput(format!(
                "unknown security type '{}'",
                s
            ))),
        }
    }
}

/// Identity metadata for a security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityInfo {
    pub security_name: String,
    pub security_type: SecurityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    /// Annual expense ratio as a percentage (0.09 means 0.09%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_ratio: Option<Decimal>,
}

impl SecurityInfo {
    pub fn new(security_name: impl Into<String>, security_type: SecurityType) -> Self {
        Self {
            security_name: security_name.into(),
            security_type,
            homepage_url: None,
            expense_ratio: None,
        }
    }

    pub fn with_expense_ratio(mut self, expense_ratio: Decimal) -> Self {
        self.expense_ratio = Some(expense_ratio);
        self
    }

    pub fn with_homepage_url(mut self, url: impl Into<String>) -> Self {
        self.homepage_url = Some(url.into());
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(er) = self.expense_ratio {
            if er.is_sign_negative() {
                return Err(ValidationError::InvalidInput(format!(
                    "expense ratio must not be negative, got {}",
                    er
                )));
            }
        }
        Ok(())
    }
}

/// Complete allocation data for one security across every taxonomy.
///
/// Instances are only obtainable through [`SecurityAllocation::builder`],
/// deserialization or [`SecurityAllocation::from_record`], all of which
/// validate every taxonomy, so a value of this type always satisfies the
/// bucket sum rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SecurityAllocationDraft")]
pub struct SecurityAllocation {
    pub(crate) symbol: String,
    #[serde(flatten)]
    pub(crate) security_info: SecurityInfo,
    pub(crate) asset_class: FundAssetAllocation,
    pub(crate) market_cap: MarketCapAllocation,
    pub(crate) us_international: UsInternationalAllocation,
    pub(crate) region: RegionAllocation,
    pub(crate) growth_value: GrowthValueAllocation,
    pub(crate) economic_status: EconomicStatusAllocation,
    pub(crate) sector: SectorAllocation,
}

impl SecurityAllocation {
    pub fn builder(symbol: impl Into<String>, info: SecurityInfo) -> SecurityAllocationBuilder {
        SecurityAllocationBuilder {
            symbol: symbol.into(),
            info,
            asset_class: None,
            market_cap: None,
            us_international: None,
            region: None,
            growth_value: None,
            economic_status: None,
            sector: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn info(&self) -> &SecurityInfo {
        &self.security_info
    }

    pub fn security_name(&self) -> &str {
        &self.security_info.security_name
    }

    pub fn security_type(&self) -> SecurityType {
        self.security_info.security_type
    }

    pub fn expense_ratio(&self) -> Option<Decimal> {
        self.security_info.expense_ratio
    }

    /// Returns the taxonomy of type `T`.
    pub fn taxonomy<T: Taxonomy>(&self) -> &T {
        T::of(self)
    }

    /// Bucket weights for a taxonomy chosen at runtime, in declared order.
    pub fn weights(&self, kind: TaxonomyKind) -> Vec<u8> {
        match kind {
            TaxonomyKind::AssetClass => self.asset_class.weights(),
            TaxonomyKind::MarketCap => self.market_cap.weights(),
            TaxonomyKind::UsInternational => self.us_international.weights(),
            TaxonomyKind::Region => self.region.weights(),
            TaxonomyKind::GrowthValue => self.growth_value.weights(),
            TaxonomyKind::EconomicStatus => self.economic_status.weights(),
            TaxonomyKind::Sector => self.sector.weights(),
        }
    }

    /// Flattens the record into `{prefix}_{bucket}_pct` columns.
    pub fn to_record(&self) -> AllocationRecord {
        let mut weights = BTreeMap::new();
        for kind in TaxonomyKind::ALL {
            let prefix = kind.key_prefix();
            for (bucket, value) in kind.buckets().iter().zip(self.weights(kind)) {
                weights.insert(crate::taxonomies::flat_key(prefix, bucket.key), value);
            }
        }

        AllocationRecord {
            symbol: self.symbol.clone(),
            security_name: self.security_info.security_name.clone(),
            security_type: self.security_info.security_type,
            homepage_url: self.security_info.homepage_url.clone(),
            expense_ratio: self.security_info.expense_ratio,
            weights,
        }
    }

    /// Rebuilds a validated allocation from its flattened form.
    pub fn from_record(record: &AllocationRecord) -> Result<Self, ValidationError> {
        let info = SecurityInfo {
            security_name: record.security_name.clone(),
            security_type: record.security_type,
            homepage_url: record.homepage_url.clone(),
            expense_ratio: record.expense_ratio,
        };

        SecurityAllocation::builder(record.symbol.clone(), info)
            .asset_class(read_flat(&record.weights)?)
            .market_cap(read_flat(&record.weights)?)
            .us_international(read_flat(&record.weights)?)
            .region(read_flat(&record.weights)?)
            .growth_value(read_flat(&record.weights)?)
            .economic_status(read_flat(&record.weights)?)
            .sector(read_flat(&record.weights)?)
            .build()
    }
}

fn read_flat<T: Taxonomy>(weights: &BTreeMap<String, u8>) -> Result<T, ValidationError> {
    let values = T::flattened_keys()
        .into_iter()
        .map(|key| {
            weights
                .get(&key)
                .copied()
                .ok_or(ValidationError::MissingField(key))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    T::from_weights(&values)
}

/// Validating builder for [`SecurityAllocation`].
#[derive(Debug, Clone)]
pub struct SecurityAllocationBuilder {
    symbol: String,
    info: SecurityInfo,
    asset_class: Option<FundAssetAllocation>,
    market_cap: Option<MarketCapAllocation>,
    us_international: Option<UsInternationalAllocation>,
    region: Option<RegionAllocation>,
    growth_value: Option<GrowthValueAllocation>,
    economic_status: Option<EconomicStatusAllocation>,
    sector: Option<SectorAllocation>,
}

impl SecurityAllocationBuilder {
    pub fn asset_class(mut self, value: FundAssetAllocation) -> Self {
        self.asset_class = Some(value);
        self
    }

    pub fn market_cap(mut self, value: MarketCapAllocation) -> Self {
        self.market_cap = Some(value);
        self
    }

    pub fn us_international(mut self, value: UsInternationalAllocation) -> Self {
        self.us_international = Some(value);
        self
    }

    pub fn region(mut self, value: RegionAllocation) -> Self {
        self.region = Some(value);
        self
    }

    pub fn growth_value(mut self, value: GrowthValueAllocation) -> Self {
        self.growth_value = Some(value);
        self
    }

    pub fn economic_status(mut self, value: EconomicStatusAllocation) -> Self {
        self.economic_status = Some(value);
        self
    }

    pub fn sector(mut self, value: SectorAllocation) -> Self {
        self.sector = Some(value);
        self
    }

    pub fn build(self) -> Result<SecurityAllocation, ValidationError> {
        let symbol = self.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()));
        }
        self.info.validate()?;

        let allocation = SecurityAllocation {
            symbol,
            security_info: self.info,
            asset_class: required(self.asset_class)?,
            market_cap: required(self.market_cap)?,
            us_international: required(self.us_international)?,
            region: required(self.region)?,
            growth_value: required(self.growth_value)?,
            economic_status: required(self.economic_status)?,
            sector: required(self.sector)?,
        };

        // Fields are public on the taxonomy structs, so re-check them here.
        allocation.asset_class.validate()?;
        allocation.market_cap.validate()?;
        allocation.us_international.validate()?;
        allocation.region.validate()?;
        allocation.growth_value.validate()?;
        allocation.economic_status.validate()?;
        allocation.sector.validate()?;

        Ok(allocation)
    }
}

fn required<T: Taxonomy>(value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField(T::KEY_PREFIX.to_string()))
}

/// Unvalidated wire shape used when deserializing a [`SecurityAllocation`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecurityAllocationDraft {
    symbol: String,
    #[serde(flatten)]
    security_info: SecurityInfo,
    asset_class: FundAssetAllocation,
    market_cap: MarketCapAllocation,
    us_international: UsInternationalAllocation,
    region: RegionAllocation,
    growth_value: GrowthValueAllocation,
    economic_status: EconomicStatusAllocation,
    sector: SectorAllocation,
}

impl TryFrom<SecurityAllocationDraft> for SecurityAllocation {
    type Error = ValidationError;

    fn try_from(draft: SecurityAllocationDraft) -> Result<Self, Self::Error> {
        SecurityAllocation::builder(draft.symbol, draft.security_info)
            .asset_class(draft.asset_class)
            .market_cap(draft.market_cap)
            .us_international(draft.us_international)
            .region(draft.region)
            .growth_value(draft.growth_value)
            .economic_status(draft.economic_status)
            .sector(draft.sector)
            .build()
    }
}

/// Flattened, tabular form of a [`SecurityAllocation`].
///
/// One column per bucket, keyed `{prefix}_{bucket}_pct`. This is the shape
/// persisted by security stores and returned by the allocation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub symbol: String,
    pub security_name: String,
    pub security_type: SecurityType,
    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub expense_ratio: Option<Decimal>,
    #[serde(flatten)]
    pub weights: BTreeMap<String, u8>,
}
