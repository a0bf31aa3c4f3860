//! Daily valuation-ratio observation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One (company, date) PE-ratio reading. Series are consumed in ascending
/// date order, one pass per simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationObservation {
    pub company_id: i64,
    pub date: NaiveDate,
    pub pe_ratio: Decimal,
}
