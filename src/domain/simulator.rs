//! Per-company buy/sell state machine.
//!
//! Walks one company's valuation series in ascending date order, at most one
//! transition per observation: Flat → Long when the ratio drops below the
//! rule's buy level (and cash covers at least one share), Long → Flat when it
//! rises above the sell level. A series that ends Long is force-liquidated at
//! the last observed date's price.
//!
//! Price resolution is mandatory at every decision point. A price the market
//! data collaborator cannot supply fails that day's decision outright; the
//! day is skipped and the series continues. Zero is never substituted: a
//! free buy is a defect, not a bargain.

use rust_decimal::Decimal;
use tracing::warn;

use crate::ports::market_data_port::MarketDataPort;

use super::company::Company;
use super::error::PetraderError;
use super::execution::{execute_buy, execute_sell, BuyResult};
use super::position::{Position, PositionState};
use super::rule::ThresholdRule;
use super::trade::TradeEvent;
use super::valuation::ValuationObservation;

/// Outcome of one company's simulation: its chronological trade list and the
/// cash it ends with. The position itself is not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanySimulation {
    pub trades: Vec<TradeEvent>,
    pub ending_cash: Decimal,
}

/// Run the state machine for one company over `observations` (ascending by
/// date, already restricted to the requested window).
///
/// An empty series yields zero trades and an ending balance equal to the
/// starting allocation. Errors other than a skippable decision day (an
/// unobtainable liquidation price, a failing collaborator) abort this
/// company; the coordinator decides what that means for the run.
pub fn simulate_company(
    company: &Company,
    rule: &ThresholdRule,
    observations: &[ValuationObservation],
    market_data: &dyn MarketDataPort,
    starting_cash: Decimal,
) -> Result<CompanySimulation, PetraderError> {
    let mut position = Position::new(starting_cash);
    let mut trades = Vec::new();

    for obs in observations {
        match position.state {
            PositionState::Flat => {
                if obs.pe_ratio < rule.buy_level {
                    let Some(price) = resolve_price(market_data, company, obs)? else {
                        continue;
                    };
                    if let BuyResult::Entered(event) =
                        execute_buy(&mut position, obs.date, obs.pe_ratio, price)
                    {
                        trades.push(event);
                    }
                }
            }
            PositionState::Long => {
                if obs.pe_ratio > rule.sell_level {
                    let Some(price) = resolve_price(market_data, company, obs)? else {
                        continue;
                    };
                    trades.push(execute_sell(&mut position, obs.date, obs.pe_ratio, price));
                }
            }
        }
    }

    // Still holding after the last observation: liquidate at the price of
    // the last observed date. This day cannot be skipped, so an unavailable
    // price fails the company.
    if position.is_long() {
        if let Some(last) = observations.last() {
            let price = match market_data.get_price(company.id, last.date) {
                Ok(p) if p > Decimal::ZERO => p,
                Ok(_) => {
                    return Err(PetraderError::PriceUnavailable {
                        company_id: company.id,
                        date: last.date,
                    });
                }
                Err(e) => return Err(e),
            };
            trades.push(execute_sell(&mut position, last.date, last.pe_ratio, price));
        }
    }

    Ok(CompanySimulation {
        trades,
        ending_cash: position.cash,
    })
}

/// Price for a triggered decision day. `Ok(None)` means the day's decision
/// failed (missing or defect-class price) and must be skipped; request-fatal
/// collaborator errors pass through.
fn resolve_price(
    market_data: &dyn MarketDataPort,
    company: &Company,
    obs: &ValuationObservation,
) -> Result<Option<Decimal>, PetraderError> {
    match market_data.get_price(company.id, obs.date) {
        Ok(price) if price > Decimal::ZERO => Ok(Some(price)),
        Ok(price) => {
            warn!(
                symbol = %company.symbol,
                date = %obs.date,
                %price,
                "non-positive price, skipping decision day"
            );
            Ok(None)
        }
        Err(e) if e.is_per_company() => {
            warn!(
                symbol = %company.symbol,
                date = %obs.date,
                error = %e,
                "price unavailable, skipping decision day"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeKind;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct PriceTable {
        prices: HashMap<NaiveDate, Decimal>,
        fail_dates: Vec<NaiveDate>,
    }

    impl PriceTable {
        fn new(entries: &[(NaiveDate, Decimal)]) -> Self {
            Self {
                prices: entries.iter().cloned().collect(),
                fail_dates: Vec::new(),
            }
        }

        fn failing_on(mut self, date: NaiveDate) -> Self {
            self.fail_dates.push(date);
            self
        }
    }

    impl MarketDataPort for PriceTable {
        fn fetch_valuations(
            &self,
            _company_id: i64,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> Result<Vec<ValuationObservation>, PetraderError> {
            Ok(Vec::new())
        }

        fn get_price(&self, company_id: i64, date: NaiveDate) -> Result<Decimal, PetraderError> {
            if self.fail_dates.contains(&date) {
                return Err(PetraderError::Database {
                    reason: "connection lost".into(),
                });
            }
            self.prices
                .get(&date)
                .copied()
                .ok_or(PetraderError::PriceUnavailable { company_id, date })
        }

        fn get_valuation_range(
            &self,
            _company_id: i64,
        ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PetraderError> {
            Ok(None)
        }
    }

    fn company() -> Company {
        Company {
            id: 1,
            symbol: "BHP".into(),
        }
    }

    fn rule() -> ThresholdRule {
        ThresholdRule {
            buy_level: dec!(10),
            sell_level: dec!(20),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(d: NaiveDate, ratio: Decimal) -> ValuationObservation {
        ValuationObservation {
            company_id: 1,
            date: d,
            pe_ratio: ratio,
        }
    }

    #[test]
    fn buy_then_sell_round_trip() {
        let d1 = date(2024, 1, 1);
        let d2 = date(2024, 1, 2);
        let market = PriceTable::new(&[(d1, dec!(100)), (d2, dec!(120))]);
        let series = vec![obs(d1, dec!(8)), obs(d2, dec!(25))];

        let sim =
            simulate_company(&company(), &rule(), &series, &market, dec!(1000000)).unwrap();

        assert_eq!(sim.trades.len(), 2);

        let buy = &sim.trades[0];
        assert_eq!(buy.kind, TradeKind::Buy);
        assert_eq!(buy.date, d1);
        assert_eq!(buy.shares, dec!(10000));
        assert_eq!(buy.price_per_share, dec!(100));
        assert_eq!(buy.balance_after, dec!(0.0000));

        let sell = &sim.trades[1];
        assert_eq!(sell.kind, TradeKind::Sell);
        assert_eq!(sell.date, d2);
        assert_eq!(sell.shares, dec!(10000));
        assert_eq!(sell.price_per_share, dec!(120));
        assert_eq!(sell.balance_after, dec!(1200000.0000));

        assert_eq!(sim.ending_cash, dec!(1200000.0000));
    }

    #[test]
    fn ratio_never_crossing_yields_no_trades() {
        let dates: Vec<NaiveDate> = (1..=5).map(|d| date(2024, 1, d)).collect();
        let market =
            PriceTable::new(&dates.iter().map(|&d| (d, dec!(100))).collect::<Vec<_>>());
        let series: Vec<_> = dates.iter().map(|&d| obs(d, dec!(15))).collect();

        let sim =
            simulate_company(&company(), &rule(), &series, &market, dec!(1000000)).unwrap();

        assert!(sim.trades.is_empty());
        assert_eq!(sim.ending_cash, dec!(1000000));
    }

    #[test]
    fn empty_series_is_no_activity() {
        let market = PriceTable::new(&[]);
        let sim = simulate_company(&company(), &rule(), &[], &market, dec!(2500000)).unwrap();
        assert!(sim.trades.is_empty());
        assert_eq!(sim.ending_cash, dec!(2500000));
    }

    #[test]
    fn series_ending_long_is_liquidated() {
        let d1 = date(2024, 1, 1);
        let d2 = date(2024, 1, 2);
        let d3 = date(2024, 1, 3);
        let market =
            PriceTable::new(&[(d1, dec!(100)), (d2, dec!(105)), (d3, dec!(110))]);
        // Buys on d1, never crosses the sell level.
        let series = vec![obs(d1, dec!(8)), obs(d2, dec!(12)), obs(d3, dec!(15))];

        let sim =
            simulate_company(&company(), &rule(), &series, &market, dec!(1000000)).unwrap();

        assert_eq!(sim.trades.len(), 2);
        let liquidation = &sim.trades[1];
        assert_eq!(liquidation.kind, TradeKind::Sell);
        assert_eq!(liquidation.date, d3);
        assert_eq!(liquidation.pe_ratio, dec!(15));
        assert_eq!(liquidation.price_per_share, dec!(110));
        assert_eq!(sim.ending_cash, dec!(1100000.0000));
    }

    #[test]
    fn hold_when_cash_below_price() {
        let d1 = date(2024, 1, 1);
        let market = PriceTable::new(&[(d1, dec!(500))]);
        let series = vec![obs(d1, dec!(5))];

        let sim = simulate_company(&company(), &rule(), &series, &market, dec!(300)).unwrap();

        assert!(sim.trades.is_empty());
        assert_eq!(sim.ending_cash, dec!(300));
    }

    #[test]
    fn missing_price_skips_the_decision_day() {
        let d1 = date(2024, 1, 1);
        let d2 = date(2024, 1, 2);
        let d3 = date(2024, 1, 3);
        // No price stored for d1: the buy signal there must fail, not fill
        // at zero. The d2 signal fills normally.
        let market = PriceTable::new(&[(d2, dec!(100)), (d3, dec!(120))]);
        let series = vec![obs(d1, dec!(8)), obs(d2, dec!(9)), obs(d3, dec!(25))];

        let sim =
            simulate_company(&company(), &rule(), &series, &market, dec!(1000000)).unwrap();

        assert_eq!(sim.trades.len(), 2);
        assert_eq!(sim.trades[0].date, d2);
        assert_eq!(sim.trades[1].date, d3);
    }

    #[test]
    fn non_positive_price_is_treated_as_unavailable() {
        let d1 = date(2024, 1, 1);
        let market = PriceTable::new(&[(d1, dec!(0))]);
        let series = vec![obs(d1, dec!(8))];

        let sim =
            simulate_company(&company(), &rule(), &series, &market, dec!(1000000)).unwrap();

        // A zero price must not produce a free position.
        assert!(sim.trades.is_empty());
        assert_eq!(sim.ending_cash, dec!(1000000));
    }

    #[test]
    fn missing_liquidation_price_fails_the_company() {
        let d1 = date(2024, 1, 1);
        let d2 = date(2024, 1, 2);
        // Price exists for the buy day only; the forced liquidation on d2
        // cannot be skipped.
        let market = PriceTable::new(&[(d1, dec!(100))]);
        let series = vec![obs(d1, dec!(8)), obs(d2, dec!(12))];

        let result = simulate_company(&company(), &rule(), &series, &market, dec!(1000000));

        assert!(matches!(
            result,
            Err(PetraderError::PriceUnavailable { company_id: 1, .. })
        ));
    }

    #[test]
    fn collaborator_failure_on_decision_day_propagates() {
        let d1 = date(2024, 1, 1);
        let market = PriceTable::new(&[(d1, dec!(100))]).failing_on(d1);
        let series = vec![obs(d1, dec!(8))];

        let result = simulate_company(&company(), &rule(), &series, &market, dec!(1000000));

        assert!(matches!(result, Err(PetraderError::Database { .. })));
    }

    #[test]
    fn no_rebuy_while_long() {
        let d1 = date(2024, 1, 1);
        let d2 = date(2024, 1, 2);
        let d3 = date(2024, 1, 3);
        let market =
            PriceTable::new(&[(d1, dec!(100)), (d2, dec!(90)), (d3, dec!(130))]);
        // Ratio stays below the buy level on d2 while already Long.
        let series = vec![obs(d1, dec!(8)), obs(d2, dec!(7)), obs(d3, dec!(25))];

        let sim =
            simulate_company(&company(), &rule(), &series, &market, dec!(1000000)).unwrap();

        assert_eq!(sim.trades.len(), 2);
        assert_eq!(sim.trades[0].kind, TradeKind::Buy);
        assert_eq!(sim.trades[1].kind, TradeKind::Sell);
    }

    #[test]
    fn multiple_round_trips() {
        let dates: Vec<NaiveDate> = (1..=4).map(|d| date(2024, 1, d)).collect();
        let market = PriceTable::new(&[
            (dates[0], dec!(100)),
            (dates[1], dec!(120)),
            (dates[2], dec!(110)),
            (dates[3], dec!(125)),
        ]);
        let series = vec![
            obs(dates[0], dec!(8)),
            obs(dates[1], dec!(25)),
            obs(dates[2], dec!(9)),
            obs(dates[3], dec!(22)),
        ];

        let sim =
            simulate_company(&company(), &rule(), &series, &market, dec!(1000000)).unwrap();

        let kinds: Vec<TradeKind> = sim.trades.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TradeKind::Buy, TradeKind::Sell, TradeKind::Buy, TradeKind::Sell]
        );
    }

    proptest! {
        // Random series against a constant-coverage price table: trade kinds
        // strictly alternate starting with Buy, buys and sells pair off
        // (liquidation closes any tail position), and no balance ever goes
        // negative.
        #[test]
        fn trade_stream_invariants(
            ratios in proptest::collection::vec(0u32..40, 0..25),
            prices in proptest::collection::vec(1u32..300, 25..26),
            buy_raw in 5u32..15,
            sell_raw in 15u32..30,
        ) {
            let start = date(2024, 1, 1);
            let series: Vec<ValuationObservation> = ratios
                .iter()
                .enumerate()
                .map(|(i, &r)| obs(start + chrono::Duration::days(i as i64), Decimal::from(r)))
                .collect();
            let price_entries: Vec<(NaiveDate, Decimal)> = prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (start + chrono::Duration::days(i as i64), Decimal::from(p)))
                .collect();
            let market = PriceTable::new(&price_entries);
            let rule = ThresholdRule {
                buy_level: Decimal::from(buy_raw),
                sell_level: Decimal::from(sell_raw),
            };

            let sim = simulate_company(&company(), &rule, &series, &market, dec!(1000000))
                .unwrap();

            for (i, trade) in sim.trades.iter().enumerate() {
                let expected = if i % 2 == 0 { TradeKind::Buy } else { TradeKind::Sell };
                prop_assert_eq!(trade.kind, expected);
                prop_assert!(trade.balance_after >= Decimal::ZERO);
            }
            // Forced liquidation guarantees a flat end state.
            prop_assert_eq!(sim.trades.len() % 2, 0);
            prop_assert!(sim.ending_cash >= Decimal::ZERO);
        }
    }
}
