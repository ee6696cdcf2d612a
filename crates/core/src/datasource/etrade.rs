//! E*Trade "Portfolios" CSV export.
//!
//! Layout:
//! - line 1 starts with `Account Summary`
//! - line 3 holds the account row; its first field is the account name
//! - the positions table starts at the header row whose first field is `Symbol`
//! - a `CASH` row carries the cash balance in its first non-empty field
//! - the table ends at a `TOTAL` row or a blank line

use std::collections::HashMap;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use rust_decimal::Decimal;

use super::datasource_traits::{DataSourceType, HoldingsSource};
use crate::errors::{DataSourceError, Result, ValidationError};
use crate::portfolio::{Holding, Portfolio};

pub const ETRADE_SOURCE_LABEL: &str = "E*Trade CSV";

const SUMMARY_MARKER: &str = "Account Summary";
const ACCOUNT_LINE: u64 = 3;

const COL_SYMBOL: &str = "Symbol";
const COL_QUANTITY: &str = "Quantity";
const COL_LAST_PRICE: &str = "Last Price $";
const COL_PRICE_PAID: &str = "Price Paid $";
const COL_VALUE: &str = "Value $";

pub struct ETradeCsvDataSource {
    content: String,
}

/// A parsed record with its 1-based line number in the file.
struct Row {
    line: u64,
    fields: Vec<String>,
}

impl Row {
    fn first(&self) -> &str {
        self.fields.first().map(|s| s.trim()).unwrap_or_default()
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }
}

impl ETradeCsvDataSource {
    pub fn new(content: impl AsRef<[u8]>) -> Self {
        let bytes = content.as_ref();
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        Self {
            content: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// First field of the account summary row.
    pub fn account_name(&self) -> Result<String> {
        account_name_from(&self.rows()?)
    }

    fn rows(&self) -> Result<Vec<Row>> {
        // The csv reader skips empty lines; line numbers let callers see them.
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(self.content.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record: StringRecord = result.map_err(DataSourceError::from)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            rows.push(Row {
                line,
                fields: record.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(rows)
    }
}

fn account_name_from(rows: &[Row]) -> Result<String> {
    rows.iter()
        .find(|row| row.line == ACCOUNT_LINE)
        .map(|row| row.first().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            DataSourceError::InvalidFormat(format!(
                "{} (no account name on line {})",
                ETRADE_SOURCE_LABEL, ACCOUNT_LINE
            ))
            .into()
        })
}

/// Column indices of the positions table.
struct Columns {
    quantity: usize,
    last_price: usize,
    price_paid: usize,
    value: usize,
}

impl Columns {
    fn from_header(header: &Row) -> std::result::Result<Self, DataSourceError> {
        let index: HashMap<&str, usize> = header
            .fields
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();
        let find = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| DataSourceError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            quantity: find(COL_QUANTITY)?,
            last_price: find(COL_LAST_PRICE)?,
            price_paid: find(COL_PRICE_PAID)?,
            value: find(COL_VALUE)?,
        })
    }
}

/// Parses a broker number such as `1,234.56` or `$12.00`.
fn parse_amount(raw: &str) -> std::result::Result<Decimal, ValidationError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    Ok(Decimal::from_str(&cleaned)?)
}

fn field<'a>(row: &'a Row, idx: usize, column: &str) -> std::result::Result<&'a str, DataSourceError> {
    row.fields
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DataSourceError::InvalidRow {
            row: row.line as usize,
            message: format!("missing value for '{}'", column),
        })
}

fn amount(row: &Row, idx: usize, column: &str) -> std::result::Result<Decimal, DataSourceError> {
    let raw = field(row, idx, column)?;
    parse_amount(raw).map_err(|e| DataSourceError::InvalidRow {
        row: row.line as usize,
        message: format!("'{}' value '{}': {}", column, raw, e),
    })
}

/// Like `amount`, but an empty or absent cell is `None` rather than an error.
fn optional_amount(
    row: &Row,
    idx: usize,
    column: &str,
) -> std::result::Result<Option<Decimal>, DataSourceError> {
    if field(row, idx, column).is_err() {
        return Ok(None);
    }
    amount(row, idx, column).map(Some)
}

fn parse_holding(row: &Row, columns: &Columns) -> Result<Holding> {
    let symbol = row.first();
    let quantity = amount(row, columns.quantity, COL_QUANTITY)?;
    let last_price = amount(row, columns.last_price, COL_LAST_PRICE)?;

    let mut holding = Holding::new(symbol, quantity, last_price)?;

    // A zero price paid means the cost basis is unknown.
    if let Some(paid) = optional_amount(row, columns.price_paid, COL_PRICE_PAID)? {
        if !paid.is_zero() {
            holding = holding.with_avg_price_paid(paid);
        }
    }
    if let Some(value) = optional_amount(row, columns.value, COL_VALUE)? {
        holding = holding.with_total_value(value);
    }

    Ok(holding)
}

fn parse_cash(row: &Row) -> Result<Decimal> {
    let raw = row
        .fields
        .iter()
        .skip(1)
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .ok_or_else(|| DataSourceError::InvalidRow {
            row: row.line as usize,
            message: "CASH row has no balance".to_string(),
        })?;
    Ok(parse_amount(raw)?)
}

impl HoldingsSource for ETradeCsvDataSource {
    fn source_type(&self) -> DataSourceType {
        DataSourceType::ETradeCsv
    }

    fn validate(&self) -> bool {
        self.content
            .lines()
            .next()
            .map(|line| line.starts_with(SUMMARY_MARKER))
            .unwrap_or(false)
    }

    fn get_portfolio(&self) -> Result<Portfolio> {
        if !self.validate() {
            return Err(DataSourceError::InvalidFormat(ETRADE_SOURCE_LABEL.to_string()).into());
        }

        let rows = self.rows()?;
        let account_name = account_name_from(&rows)?;

        let header_idx = rows
            .iter()
            .position(|row| row.first() == COL_SYMBOL)
            .ok_or_else(|| DataSourceError::MissingColumn(COL_SYMBOL.to_string()))?;
        let columns = Columns::from_header(&rows[header_idx])?;

        let mut portfolio = Portfolio::new(account_name, ETRADE_SOURCE_LABEL, None);
        let mut previous_line = rows[header_idx].line;

        for row in &rows[header_idx + 1..] {
            if row.line > previous_line + 1 || row.is_blank() {
                break;
            }
            previous_line = row.line;

            match row.first() {
                "TOTAL" => break,
                "CASH" => {
                    let cash = parse_cash(row)?;
                    portfolio.set_cash(cash)?;
                }
                _ => {
                    let holding = parse_holding(row, &columns)?;
                    debug!("Parsed {} x {}", holding.symbol, holding.quantity);
                    if portfolio.holding(&holding.symbol).is_some() {
                        warn!("Duplicate row for {}, keeping the last one", holding.symbol);
                    }
                    portfolio.add_security(holding)?;
                }
            }
        }

        debug!(
            "Parsed E*Trade export '{}': {} holdings, cash {}",
            portfolio.account_name(),
            portfolio.holdings().len(),
            portfolio.cash()
        );
        Ok(portfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::portfolio::CompletionState;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "\
Account Summary
Account,Net Account Value,Total Gain $,Total Gain %,Day's Gain Unrealized $,Day's Gain Unrealized %,Available For Withdrawal,Cash Purchasing Power
Roth IRA -XXXX,\"4,749.99\",1580.00,49.85,12.00,0.25,999.99,999.99

View Summary - All Positions
Filters Applied - Account Types: All
Symbol,Last Price $,Change $,Change %,Quantity,Price Paid $,Day's Gain $,Total Gain $,Total Gain %,Value $
SPY,100.00,1.00,1.00,10,50.00,10.00,500.00,100.00,\"1,000.00\"
VTI,200.00,0.50,0.25,8,180.00,4.00,160.00,11.11,1600.00
VWO,50.00,-0.10,-0.20,5,0.00,-0.50,0.00,0.00,250.00
ARKK,300.00,2.00,0.67,3,10.00,6.00,870.00,2900.00,900.00
CASH,,,,,,,,,999.99
TOTAL,,,,,,,,,4749.99

Generated at 10/19/2026 09:30 AM ET
";

    #[test]
    fn test_validate() {
        assert!(ETradeCsvDataSource::new(SAMPLE).validate());
        assert!(!ETradeCsvDataSource::new("Symbol,Quantity\nVTI,1\n").validate());
        assert!(!ETradeCsvDataSource::new("").validate());
    }

    #[test]
    fn test_account_name() {
        let source = ETradeCsvDataSource::new(SAMPLE);
        assert_eq!(source.account_name().unwrap(), "Roth IRA -XXXX");
    }

    #[test]
    fn test_get_portfolio() {
        let portfolio = ETradeCsvDataSource::new(SAMPLE).get_portfolio().unwrap();

        assert_eq!(portfolio.account_name(), "Roth IRA -XXXX");
        assert_eq!(portfolio.source(), "E*Trade CSV");
        assert_eq!(portfolio.cash(), dec!(999.99));
        assert_eq!(portfolio.holdings().len(), 4);
        assert_eq!(portfolio.state(), CompletionState::Populated);
        assert_eq!(portfolio.total_value(), dec!(4749.99));

        let spy = portfolio.holding("SPY").unwrap();
        assert_eq!(spy.quantity, dec!(10));
        assert_eq!(spy.last_price, dec!(100));
        assert_eq!(spy.avg_price_paid, Some(dec!(50)));
        assert_eq!(spy.total_value, dec!(1000));
        assert!(spy.name.is_none());

        // Zero price paid: unknown cost basis
        let vwo = portfolio.holding("VWO").unwrap();
        assert_eq!(vwo.avg_price_paid, None);
        assert_eq!(vwo.total_return(), None);
    }

    #[test]
    fn test_table_ends_at_blank_line() {
        let content = "\
Account Summary
Account,Net Account Value
Brokerage -1234,100.00

Symbol,Last Price $,Quantity,Price Paid $,Value $
VTI,10.00,2,5.00,20.00
CASH,80.00

BND,10.00,1,5.00,10.00
";
        let portfolio = ETradeCsvDataSource::new(content).get_portfolio().unwrap();
        assert_eq!(portfolio.holdings().len(), 1);
        assert_eq!(portfolio.cash(), dec!(80));
        assert!(portfolio.holding("BND").is_none());
    }

    #[test]
    fn test_missing_column() {
        let content = "\
Account Summary
Account
Brokerage -1234
Symbol,Quantity,Value $
VTI,2,20.00
";
        let err = ETradeCsvDataSource::new(content).get_portfolio().unwrap_err();
        assert!(matches!(
            err,
            Error::DataSource(DataSourceError::MissingColumn(ref c)) if c == "Last Price $"
        ));
    }

    #[test]
    fn test_bad_number_reports_row() {
        let content = "\
Account Summary
Account
Brokerage -1234
Symbol,Last Price $,Quantity,Price Paid $,Value $
VTI,abc,2,5.00,20.00
";
        let err = ETradeCsvDataSource::new(content).get_portfolio().unwrap_err();
        assert!(matches!(
            err,
            Error::DataSource(DataSourceError::InvalidRow { row: 5, .. })
        ));
    }

    #[test]
    fn test_malformed_optional_cell_reports_row() {
        let content = "\
Account Summary
Account
Brokerage -1234
Symbol,Last Price $,Quantity,Price Paid $,Value $
VTI,10.00,2,5.00,1.2.3
";
        let err = ETradeCsvDataSource::new(content).get_portfolio().unwrap_err();
        assert!(matches!(
            err,
            Error::DataSource(DataSourceError::InvalidRow { row: 5, ref message })
                if message.contains("Value $")
        ));

        let content = content.replace("5.00,1.2.3", "n/a,20.00");
        let err = ETradeCsvDataSource::new(content).get_portfolio().unwrap_err();
        assert!(matches!(
            err,
            Error::DataSource(DataSourceError::InvalidRow { row: 5, ref message })
                if message.contains("Price Paid $")
        ));
    }

    #[test]
    fn test_empty_optional_cells_are_skipped() {
        let content = "\
Account Summary
Account
Brokerage -1234
Symbol,Last Price $,Quantity,Price Paid $,Value $
VTI,10.00,2,,
BND,5.00,4
";
        let portfolio = ETradeCsvDataSource::new(content).get_portfolio().unwrap();
        let vti = portfolio.holding("VTI").unwrap();
        assert_eq!(vti.avg_price_paid, None);
        assert_eq!(vti.total_value, dec!(20));
        assert_eq!(portfolio.holding("BND").unwrap().total_value, dec!(20));
    }

    #[test]
    fn test_overflowing_position_is_rejected() {
        let content = "\
Account Summary
Account,Net Account Value
Brokerage -1234,100.00

Symbol,Last Price $,Quantity,Price Paid $,Value $
VTI,10000000000,100000000000000000000,5.00,20.00
";
        let err = ETradeCsvDataSource::new(content).get_portfolio().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidInput(ref message))
                if message.contains("overflow")
        ));
    }

    #[test]
    fn test_missing_account_name() {
        let content = "\
Account Summary
Account

Symbol,Last Price $,Quantity,Price Paid $,Value $
VTI,10.00,2,5.00,20.00
";
        let err = ETradeCsvDataSource::new(content).get_portfolio().unwrap_err();
        assert!(matches!(err, Error::DataSource(DataSourceError::InvalidFormat(_))));
    }

    #[test]
    fn test_wrong_format_rejected() {
        let err = ETradeCsvDataSource::new("Symbol,Quantity\n")
            .get_portfolio()
            .unwrap_err();
        assert!(matches!(err, Error::DataSource(DataSourceError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount(" $12.00 ").unwrap(), dec!(12));
        assert!(parse_amount("n/a").is_err());
    }
}
