//! Response projection of a finished run.
//!
//! A pure, side-effect-free mapping from [`BacktestResult`] onto the wire
//! contract; no value is altered on the way through. Dates are rendered as
//! `YYYY-MM-DD` strings and decimals serialize as exact JSON numbers.

use rust_decimal::Decimal;
use serde::Serialize;

use super::backtest::BacktestResult;
use super::trade::{Trade, TradeKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRow {
    pub number: u64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub date: String,
    #[serde(rename = "peRatio", with = "rust_decimal::serde::arbitrary_precision")]
    pub pe_ratio: Decimal,
    #[serde(rename = "pricePerShare", with = "rust_decimal::serde::arbitrary_precision")]
    pub price_per_share: Decimal,
    #[serde(rename = "bankAccountBalance", with = "rust_decimal::serde::arbitrary_precision")]
    pub bank_account_balance: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub shares: Decimal,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        TradeRow {
            number: trade.number,
            symbol: trade.symbol.clone(),
            kind: trade.kind,
            date: trade.date.format("%Y-%m-%d").to_string(),
            pe_ratio: trade.pe_ratio,
            price_per_share: trade.price_per_share,
            bank_account_balance: trade.balance_after,
            shares: trade.shares,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub trades: Vec<TradeRow>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub final_total_balance: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub profit_loss_percentage: Decimal,
}

impl From<&BacktestResult> for BacktestReport {
    fn from(result: &BacktestResult) -> Self {
        BacktestReport {
            trades: result.trades.iter().map(TradeRow::from).collect(),
            final_total_balance: result.final_total_balance,
            profit_loss_percentage: result.profit_loss_percentage,
        }
    }
}
