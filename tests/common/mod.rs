#![allow(dead_code)]

use chrono::NaiveDate;
use petrader::domain::company::Company;
use petrader::domain::error::PetraderError;
use petrader::domain::rule::ThresholdRule;
use petrader::domain::valuation::ValuationObservation;
use petrader::ports::directory_port::DirectoryPort;
use petrader::ports::market_data_port::MarketDataPort;
use petrader::ports::rule_port::RulePort;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub struct MockRulePort {
    pub rules: HashMap<i64, ThresholdRule>,
}

impl MockRulePort {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, rule_id: i64, buy_level: Decimal, sell_level: Decimal) -> Self {
        self.rules.insert(
            rule_id,
            ThresholdRule {
                buy_level,
                sell_level,
            },
        );
        self
    }
}

impl RulePort for MockRulePort {
    fn get_rule(&self, rule_id: i64) -> Result<ThresholdRule, PetraderError> {
        self.rules
            .get(&rule_id)
            .copied()
            .ok_or(PetraderError::RuleNotFound { rule_id })
    }
}

pub struct MockDirectory {
    pub companies: Vec<Company>,
    pub error: Option<String>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            companies: Vec::new(),
            error: None,
        }
    }

    pub fn with_company(mut self, id: i64, symbol: &str) -> Self {
        self.companies.push(Company {
            id,
            symbol: symbol.to_string(),
        });
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DirectoryPort for MockDirectory {
    fn list_companies(&self) -> Result<Vec<Company>, PetraderError> {
        if let Some(reason) = &self.error {
            return Err(PetraderError::Directory {
                reason: reason.clone(),
            });
        }
        Ok(self.companies.clone())
    }
}

#[derive(Default)]
pub struct MockMarketData {
    pub valuations: HashMap<i64, Vec<ValuationObservation>>,
    pub prices: HashMap<(i64, NaiveDate), Decimal>,
    pub series_errors: HashMap<i64, String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// One row per observed day: (date, pe_ratio, price). A None price means
    /// the valuation exists but no price is stored for that date.
    pub fn with_series(
        mut self,
        company_id: i64,
        rows: Vec<(NaiveDate, Decimal, Option<Decimal>)>,
    ) -> Self {
        let observations = rows
            .iter()
            .map(|&(date, pe_ratio, _)| ValuationObservation {
                company_id,
                date,
                pe_ratio,
            })
            .collect();
        for &(date, _, price) in &rows {
            if let Some(price) = price {
                self.prices.insert((company_id, date), price);
            }
        }
        self.valuations.insert(company_id, observations);
        self
    }

    pub fn with_series_error(mut self, company_id: i64, reason: &str) -> Self {
        self.series_errors.insert(company_id, reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_valuations(
        &self,
        company_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ValuationObservation>, PetraderError> {
        if let Some(reason) = self.series_errors.get(&company_id) {
            return Err(PetraderError::CompanyData {
                company_id,
                reason: reason.clone(),
            });
        }
        Ok(self
            .valuations
            .get(&company_id)
            .map(|series| {
                series
                    .iter()
                    .filter(|obs| obs.date >= start_date && obs.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_price(&self, company_id: i64, date: NaiveDate) -> Result<Decimal, PetraderError> {
        self.prices
            .get(&(company_id, date))
            .copied()
            .ok_or(PetraderError::PriceUnavailable { company_id, date })
    }

    fn get_valuation_range(
        &self,
        company_id: i64,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PetraderError> {
        Ok(self.valuations.get(&company_id).and_then(|series| {
            let min = series.iter().map(|o| o.date).min()?;
            let max = series.iter().map(|o| o.date).max()?;
            Some((min, max, series.len()))
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
