//! Backtest coordination: allocation, per-company simulation, aggregation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::ports::directory_port::DirectoryPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::rule_port::RulePort;

use super::allocation::allocate_per_company;
use super::company::{sort_for_processing, Company};
use super::error::PetraderError;
use super::simulator::simulate_company;
use super::trade::{Trade, TradeEvent};

/// Validated parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestParams {
    pub rule_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), PetraderError> {
        if self.rule_id < 1 {
            return Err(PetraderError::Validation {
                reason: format!("rule id must be positive, got {}", self.rule_id),
            });
        }
        if self.end_date < self.start_date {
            return Err(PetraderError::Validation {
                reason: format!(
                    "end date {} precedes start date {}",
                    self.end_date, self.start_date
                ),
            });
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(PetraderError::Validation {
                reason: format!(
                    "initial capital must be positive, got {}",
                    self.initial_capital
                ),
            });
        }
        Ok(())
    }
}

/// Aggregated outcome of a run. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub final_total_balance: Decimal,
    pub profit_loss_percentage: Decimal,
}

/// Drive a full run: resolve the rule, list and sort the universe, allocate
/// capital evenly, simulate each company in turn, then number and aggregate.
///
/// Rule and directory failures are fatal. A company whose series cannot be
/// fetched, or whose simulation fails (e.g. no liquidation price), is
/// skipped: its untouched allocation still counts toward the final balance
/// and the run continues.
///
/// Companies are processed in ascending-symbol order and trade sequence
/// numbers are assigned in a post-pass over that fixed order, so repeated
/// runs over the same inputs produce identical ledgers.
pub fn run_backtest(
    rule_port: &dyn RulePort,
    directory: &dyn DirectoryPort,
    market_data: &dyn MarketDataPort,
    params: &BacktestParams,
) -> Result<BacktestResult, PetraderError> {
    params.validate()?;

    let rule = rule_port.get_rule(params.rule_id)?;

    let mut companies = directory.list_companies()?;
    sort_for_processing(&mut companies);

    let allocation = allocate_per_company(params.initial_capital, companies.len())?;

    let mut outcomes: Vec<(Company, Vec<TradeEvent>)> = Vec::with_capacity(companies.len());
    let mut final_total = Decimal::ZERO;

    for company in &companies {
        let observations = match market_data.fetch_valuations(
            company.id,
            params.start_date,
            params.end_date,
        ) {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol = %company.symbol, error = %e, "skipping company: valuation series unavailable");
                final_total += allocation;
                continue;
            }
        };

        match simulate_company(company, &rule, &observations, market_data, allocation) {
            Ok(sim) => {
                final_total += sim.ending_cash;
                outcomes.push((company.clone(), sim.trades));
            }
            Err(e) => {
                warn!(symbol = %company.symbol, error = %e, "skipping company: simulation failed");
                final_total += allocation;
            }
        }
    }

    // Global sequence numbers: company-processing order, chronological
    // within a company. Assigned here rather than during simulation so the
    // per-company work stays order-independent.
    let mut trades = Vec::new();
    let mut number: u64 = 0;
    for (company, events) in outcomes {
        for event in events {
            number += 1;
            trades.push(Trade::from_event(number, &company.symbol, event));
        }
    }

    let profit_loss_percentage =
        (final_total - params.initial_capital) / params.initial_capital * dec!(100);

    Ok(BacktestResult {
        trades,
        final_total_balance: final_total,
        profit_loss_percentage,
    })
}
