//! Wire types for the OpenAI chat completions API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use folioscope_core::errors::ValidationError;
use folioscope_core::securities::{SecurityAllocation, SecurityInfo, SecurityType};
use folioscope_core::taxonomies::{
    EconomicStatusAllocation, FundAssetAllocation, GrowthValueAllocation, MarketCapAllocation,
    RegionAllocation, SectorAllocation, TaxonomyKind, UsInternationalAllocation,
};

pub(crate) const TOOL_NAME: &str = "record_security_allocation";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<Tool>,
    pub tool_choice: ToolChoice,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Tool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDef,
}

#[derive(Debug, Serialize)]
pub(crate) struct FunctionDef {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: ToolChoiceFunction,
}

#[derive(Debug, Serialize)]
pub(crate) struct ToolChoiceFunction {
    pub name: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,
    /// JSON-encoded tool arguments
    pub arguments: String,
}

/// Tool arguments as produced by the model.
#[derive(Debug, Deserialize)]
pub(crate) struct AllocationPayload {
    #[serde(default)]
    pub symbol: Option<String>,
    pub security_name: String,
    pub security_type: String,
    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub expense_ratio: Option<Decimal>,
    #[serde(default)]
    pub fund_asset_allocation: FundAssetAllocation,
    #[serde(default)]
    pub market_cap_allocation: MarketCapAllocation,
    #[serde(default)]
    pub us_international_allocation: UsInternationalAllocation,
    #[serde(default)]
    pub region_allocation: RegionAllocation,
    #[serde(default)]
    pub growth_value_allocation: GrowthValueAllocation,
    #[serde(default)]
    pub economic_status_allocation: EconomicStatusAllocation,
    #[serde(default)]
    pub sector_allocation: SectorAllocation,
}

impl AllocationPayload {
    /// Validates the payload into an allocation keyed by `symbol`.
    pub fn into_allocation(self, symbol: &str) -> Result<SecurityAllocation, ValidationError> {
        if let Some(returned) = self.symbol.as_deref() {
            if !returned.eq_ignore_ascii_case(symbol) {
                log::debug!("Model answered for {} when asked about {}", returned, symbol);
            }
        }

        let info = SecurityInfo {
            security_name: self.security_name,
            security_type: self
                .security_type
                .parse()
                .unwrap_or(SecurityType::Other),
            homepage_url: self.homepage_url.filter(|url| !url.trim().is_empty()),
            expense_ratio: self.expense_ratio,
        };

        SecurityAllocation::builder(symbol, info)
            .asset_class(self.fund_asset_allocation)
            .market_cap(self.market_cap_allocation)
            .us_international(self.us_international_allocation)
            .region(self.region_allocation)
            .growth_value(self.growth_value_allocation)
            .economic_status(self.economic_status_allocation)
            .sector(self.sector_allocation)
            .build()
    }
}

fn payload_field(kind: TaxonomyKind) -> &'static str {
    match kind {
        TaxonomyKind::AssetClass => "fund_asset_allocation",
        TaxonomyKind::MarketCap => "market_cap_allocation",
        TaxonomyKind::UsInternational => "us_international_allocation",
        TaxonomyKind::Region => "region_allocation",
        TaxonomyKind::GrowthValue => "growth_value_allocation",
        TaxonomyKind::EconomicStatus => "economic_status_allocation",
        TaxonomyKind::Sector => "sector_allocation",
    }
}

/// JSON schema for the tool arguments, derived from the taxonomy metadata.
pub(crate) fn allocation_schema() -> Value {
    let mut properties = Map::new();
    properties.insert("symbol".into(), json!({ "type": "string" }));
    properties.insert("security_name".into(), json!({ "type": "string" }));
    properties.insert(
        "security_type".into(),
        json!({
            "type": "string",
            "enum": SecurityType::ALL.iter().map(|t| t.display_name()).collect::<Vec<_>>(),
        }),
    );
    properties.insert("homepage_url".into(), json!({ "type": "string" }));
    properties.insert(
        "expense_ratio".into(),
        json!({ "type": "number", "description": "Annual expense ratio in percent" }),
    );

    let mut required: Vec<&str> = vec!["security_name", "security_type"];
    for kind in TaxonomyKind::ALL {
        let buckets: Map<String, Value> = kind
            .buckets()
            .iter()
            .map(|b| {
                (
                    b.key.to_string(),
                    json!({
                        "type": "integer",
                        "minimum": 0,
                        "maximum": 100,
                        "description": b.label,
                    }),
                )
            })
            .collect();
        properties.insert(
            payload_field(kind).into(),
            json!({
                "type": "object",
                "description": format!("{} split as integer percentages summing to 100", kind.name()),
                "properties": buckets,
            }),
        );
        required.push(payload_field(kind));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_every_bucket() {
        let schema = allocation_schema();
        let region = &schema["properties"]["region_allocation"]["properties"];
        assert_eq!(region["north_america"]["maximum"], 100);
        assert_eq!(region["apac"]["description"], "Asia/Pacific");
        assert_eq!(
            schema["properties"]["sector_allocation"]["properties"]
                .as_object()
                .map(|o| o.len()),
            Some(11)
        );
        assert_eq!(schema["required"].as_array().map(|r| r.len()), Some(9));
    }

    #[test]
    fn test_payload_missing_buckets_default_to_zero() {
        let payload: AllocationPayload = serde_json::from_value(json!({
            "security_name": "Vanguard Total Stock Market ETF",
            "security_type": "ETF",
            "fund_asset_allocation": { "stocks": 100 },
            "market_cap_allocation": { "large_cap": 70, "mid_cap": 20, "small_cap": 10 },
            "us_international_allocation": { "us": 100 },
            "region_allocation": { "north_america": 100 },
            "growth_value_allocation": { "growth": 50, "value": 50 },
            "economic_status_allocation": { "developed": 100 },
            "sector_allocation": { "information_technology": 100 }
        }))
        .unwrap();

        let allocation = payload.into_allocation("VTI").unwrap();
        assert_eq!(allocation.symbol(), "VTI");
        assert_eq!(allocation.weights(TaxonomyKind::AssetClass), vec![100, 0, 0, 0]);
    }

    #[test]
    fn test_payload_with_bad_sum_fails_validation() {
        let payload: AllocationPayload = serde_json::from_value(json!({
            "security_name": "Broken",
            "security_type": "Stock",
            "fund_asset_allocation": { "stocks": 100 },
            "market_cap_allocation": { "large_cap": 100 },
            "us_international_allocation": { "us": 60, "international": 60 },
            "region_allocation": { "global": 100 },
            "growth_value_allocation": { "growth": 100 },
            "economic_status_allocation": { "developed": 100 },
            "sector_allocation": { "energy": 100 }
        }))
        .unwrap();

        let err = payload.into_allocation("BRK").unwrap_err();
        assert_eq!(
            err,
            ValidationError::BucketSumMismatch {
                taxonomy: "intl",
                sum: 120
            }
        );
    }
}
