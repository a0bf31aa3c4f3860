//! Trade ledger records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeKind {
    Buy,
    Sell,
}

/// A trade as emitted by one company's simulator, before the coordinator
/// assigns its global sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub kind: TradeKind,
    pub date: NaiveDate,
    pub pe_ratio: Decimal,
    pub price_per_share: Decimal,
    /// Cash balance of the company's account immediately after the trade.
    pub balance_after: Decimal,
    /// Whole-unit share count: bought for a Buy, sold for a Sell.
    pub shares: Decimal,
}

/// A numbered ledger entry. Immutable once built; `number` is monotonic
/// across the whole run, never reset per company.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub number: u64,
    pub symbol: String,
    pub kind: TradeKind,
    pub date: NaiveDate,
    pub pe_ratio: Decimal,
    pub price_per_share: Decimal,
    pub balance_after: Decimal,
    pub shares: Decimal,
}

impl Trade {
    pub fn from_event(number: u64, symbol: &str, event: TradeEvent) -> Self {
        Trade {
            number,
            symbol: symbol.to_string(),
            kind: event.kind,
            date: event.date,
            pe_ratio: event.pe_ratio,
            price_per_share: event.price_per_share,
            balance_after: event.balance_after,
            shares: event.shares,
        }
    }
}
