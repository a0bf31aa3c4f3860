//! Buy/sell fill mechanics for one position.
//!
//! Lot sizing is whole units: shares = floor(cash / price). Every
//! cash-affecting amount is rounded to 4 decimal places before it is stored
//! or compared, so repeated mutations cannot accumulate sub-scale residue.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::position::{Position, PositionState};
use super::trade::{TradeEvent, TradeKind};

pub const CASH_SCALE: u32 = 4;

/// Result of a buy attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum BuyResult {
    Entered(TradeEvent),
    InsufficientCash,
}

/// Enter a long position: spend as much of the cash as whole-unit lots
/// allow. Requires cash >= price for at least one share; otherwise the
/// position is left untouched.
pub fn execute_buy(
    position: &mut Position,
    date: NaiveDate,
    pe_ratio: Decimal,
    price: Decimal,
) -> BuyResult {
    if position.cash < price {
        return BuyResult::InsufficientCash;
    }

    let shares = (position.cash / price).floor();
    let cost = (shares * price).round_dp(CASH_SCALE);

    position.cash = (position.cash - cost).round_dp(CASH_SCALE);
    position.shares_owned = shares;
    position.state = PositionState::Long;

    BuyResult::Entered(TradeEvent {
        kind: TradeKind::Buy,
        date,
        pe_ratio,
        price_per_share: price,
        balance_after: position.cash,
        shares,
    })
}

/// Exit the position entirely: all held shares at the given price. Used for
/// both rule-triggered sells and the end-of-series liquidation.
pub fn execute_sell(
    position: &mut Position,
    date: NaiveDate,
    pe_ratio: Decimal,
    price: Decimal,
) -> TradeEvent {
    let shares = position.shares_owned;
    let revenue = (shares * price).round_dp(CASH_SCALE);

    position.cash = (position.cash + revenue).round_dp(CASH_SCALE);
    position.shares_owned = Decimal::ZERO;
    position.state = PositionState::Flat;

    TradeEvent {
        kind: TradeKind::Sell,
        date,
        pe_ratio,
        price_per_share: price,
        balance_after: position.cash,
        shares,
    }
}
