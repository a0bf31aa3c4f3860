//! Market data access port trait.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::error::PetraderError;
use crate::domain::valuation::ValuationObservation;

pub trait MarketDataPort {
    /// Valuation observations for one company, ascending by date, restricted
    /// to [start_date, end_date]. May be empty.
    fn fetch_valuations(
        &self,
        company_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ValuationObservation>, PetraderError>;

    /// Point price lookup. A missing price is `PriceUnavailable`, never an
    /// implicit zero.
    fn get_price(&self, company_id: i64, date: NaiveDate) -> Result<Decimal, PetraderError>;

    /// (min date, max date, observation count) of the stored valuation
    /// series, or None when the company has no data.
    fn get_valuation_range(
        &self,
        company_id: i64,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PetraderError>;
}
