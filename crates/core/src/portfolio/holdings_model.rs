//! Holding (position) models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::securities::SecurityType;

/// A position in one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    /// Display name; backfilled from allocation data during completion.
    pub name: Option<String>,
    pub security_type: Option<SecurityType>,
    pub quantity: Decimal,
    pub last_price: Decimal,
    /// Average cost per unit. Unknown for transferred-in or cash-like positions.
    pub avg_price_paid: Option<Decimal>,
    /// Market value as reported, or `quantity * last_price`.
    pub total_value: Decimal,
}

impl Holding {
    pub fn new(
        symbol: impl Into<String>,
        quantity: Decimal,
        last_price: Decimal,
    ) -> Result<Self, ValidationError> {
        let mut holding = Self {
            symbol: symbol.into().trim().to_string(),
            name: None,
            security_type: None,
            quantity,
            last_price,
            avg_price_paid: None,
            total_value: Decimal::ZERO,
        };
        holding.validate()?;
        holding.total_value = holding.market_value()?;
        Ok(holding)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_security_type(mut self, security_type: SecurityType) -> Self {
        self.security_type = Some(security_type);
        self
    }

    pub fn with_avg_price_paid(mut self, avg_price_paid: Decimal) -> Self {
        self.avg_price_paid = Some(avg_price_paid);
        self
    }

    /// Overrides the computed total with a broker-reported value.
    pub fn with_total_value(mut self, total_value: Decimal) -> Self {
        self.total_value = total_value;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()));
        }
        if self.quantity.is_sign_negative() && !self.quantity.is_zero() {
            return Err(ValidationError::NegativeQuantity {
                symbol: self.symbol.clone(),
                quantity: self.quantity,
            });
        }
        if self.last_price.is_sign_negative() && !self.last_price.is_zero() {
            return Err(ValidationError::InvalidInput(format!(
                "last price for {} must not be negative, got {}",
                self.symbol, self.last_price
            )));
        }
        self.market_value()?;
        Ok(())
    }

    /// Current market value used for exposure weighting.
    ///
    /// Fails when `quantity * last_price` does not fit in a `Decimal`.
    pub fn market_value(&self) -> Result<Decimal, ValidationError> {
        self.quantity.checked_mul(self.last_price).ok_or_else(|| {
            ValidationError::InvalidInput(format!("value overflow for {}", self.symbol))
        })
    }

    /// `total_value - avg_price_paid * quantity`, undefined without a cost
    /// basis or when the result does not fit in a `Decimal`.
    pub fn total_return(&self) -> Option<Decimal> {
        let avg = self.avg_price_paid.filter(|avg| !avg.is_zero())?;
        if self.quantity.is_zero() {
            return None;
        }
        avg.checked_mul(self.quantity)
            .and_then(|cost| self.total_value.checked_sub(cost))
    }

    pub fn to_summary(&self) -> HoldingSummary {
        HoldingSummary {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            security_type: self.security_type,
            quantity: self.quantity,
            last_price: self.last_price,
            avg_price_paid: self.avg_price_paid,
            total_value: self.total_value,
            total_return: self.total_return(),
        }
    }
}

/// One row of the holdings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSummary {
    pub symbol: String,
    pub name: Option<String>,
    pub security_type: Option<SecurityType>,
    pub quantity: Decimal,
    pub last_price: Decimal,
    pub avg_price_paid: Option<Decimal>,
    pub total_value: Decimal,
    pub total_return: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_value_defaults_to_quantity_times_price() {
        let holding = Holding::new("SPY", dec!(10), dec!(100)).unwrap();
        assert_eq!(holding.total_value, dec!(1000));
        assert_eq!(holding.market_value().unwrap(), dec!(1000));

        let reported = holding.with_total_value(dec!(1000.37));
        assert_eq!(reported.total_value, dec!(1000.37));
        assert_eq!(reported.market_value().unwrap(), dec!(1000));
    }

    #[test]
    fn test_total_return() {
        let holding = Holding::new("ARKK", dec!(3), dec!(300))
            .unwrap()
            .with_avg_price_paid(dec!(10));
        assert_eq!(holding.total_return(), Some(dec!(870)));
    }

    #[test]
    fn test_total_return_undefined_without_cost_basis() {
        let holding = Holding::new("VTI", dec!(8), dec!(200)).unwrap();
        assert_eq!(holding.total_return(), None);

        let holding = holding.with_avg_price_paid(Decimal::ZERO);
        assert_eq!(holding.total_return(), None);

        let holding = Holding::new("VTI", Decimal::ZERO, dec!(200))
            .unwrap()
            .with_avg_price_paid(dec!(180));
        assert_eq!(holding.total_return(), None);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = Holding::new("VTI", dec!(-1), dec!(200)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NegativeQuantity {
                symbol: "VTI".to_string(),
                quantity: dec!(-1)
            }
        );
    }

    #[test]
    fn test_summary_carries_return() {
        let summary = Holding::new("VWO", dec!(5), dec!(50))
            .unwrap()
            .with_avg_price_paid(dec!(40))
            .with_name("Vanguard FTSE Emerging Markets")
            .to_summary();
        assert_eq!(summary.total_return, Some(dec!(50)));
        assert_eq!(summary.name.as_deref(), Some("Vanguard FTSE Emerging Markets"));
    }

    #[test]
    fn test_overflowing_value_is_rejected() {
        let err = Holding::new("VTI", dec!(100000000000000000000), dec!(10000000000)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidInput("value overflow for VTI".to_string())
        );

        let mut holding = Holding::new("VTI", dec!(1), dec!(1)).unwrap();
        holding.quantity = Decimal::MAX;
        holding.last_price = dec!(2);
        assert!(holding.validate().is_err());
        assert!(holding.market_value().is_err());
    }

    #[test]
    fn test_total_return_overflow_is_undefined() {
        let holding = Holding::new("VTI", dec!(10), dec!(1))
            .unwrap()
            .with_avg_price_paid(Decimal::MAX);
        assert_eq!(holding.total_return(), None);
    }
}
