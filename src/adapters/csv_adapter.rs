//! CSV file data adapter.
//!
//! File layout under the base directory:
//! - `companies.csv`: `id,symbol`
//! - `rules.csv`: `id,buy_level,sell_level`
//! - `{SYMBOL}.csv`: `date,pe_ratio,price`, one row per observed day. An
//!   empty price cell means no price exists for that date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::company::Company;
use crate::domain::error::PetraderError;
use crate::domain::rule::ThresholdRule;
use crate::domain::valuation::ValuationObservation;
use crate::ports::directory_port::DirectoryPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::rule_port::RulePort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn companies_path(&self) -> PathBuf {
        self.base_path.join("companies.csv")
    }

    fn rules_path(&self) -> PathBuf {
        self.base_path.join("rules.csv")
    }

    fn series_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn load_companies(&self) -> Result<Vec<Company>, PetraderError> {
        let path = self.companies_path();
        let content = fs::read_to_string(&path).map_err(|e| PetraderError::Directory {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut companies = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PetraderError::Directory {
                reason: format!("CSV parse error: {}", e),
            })?;

            let id: i64 = field(&record, 0, "id")
                .map_err(|reason| PetraderError::Directory { reason })?
                .parse()
                .map_err(|e| PetraderError::Directory {
                    reason: format!("invalid company id: {}", e),
                })?;
            let symbol = field(&record, 1, "symbol")
                .map_err(|reason| PetraderError::Directory { reason })?
                .to_string();

            companies.push(Company { id, symbol });
        }

        Ok(companies)
    }

    fn symbol_for(&self, company_id: i64) -> Result<String, PetraderError> {
        self.load_companies()?
            .into_iter()
            .find(|c| c.id == company_id)
            .map(|c| c.symbol)
            .ok_or(PetraderError::CompanyData {
                company_id,
                reason: "unknown company id".to_string(),
            })
    }

    /// Parsed rows of one company's series file: (date, ratio, optional price).
    fn load_series(
        &self,
        company_id: i64,
    ) -> Result<Vec<(NaiveDate, Decimal, Option<Decimal>)>, PetraderError> {
        let symbol = self.symbol_for(company_id)?;
        let path = self.series_path(&symbol);
        let content = fs::read_to_string(&path).map_err(|e| PetraderError::CompanyData {
            company_id,
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PetraderError::CompanyData {
                company_id,
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = field(&record, 0, "date")
                .map_err(|reason| PetraderError::CompanyData { company_id, reason })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                PetraderError::CompanyData {
                    company_id,
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let ratio_str = field(&record, 1, "pe_ratio")
                .map_err(|reason| PetraderError::CompanyData { company_id, reason })?;
            let pe_ratio =
                Decimal::from_str(ratio_str).map_err(|e| PetraderError::CompanyData {
                    company_id,
                    reason: format!("invalid pe_ratio value: {}", e),
                })?;

            let price = match record.get(2).map(str::trim) {
                None | Some("") => None,
                Some(raw) => {
                    Some(
                        Decimal::from_str(raw).map_err(|e| PetraderError::CompanyData {
                            company_id,
                            reason: format!("invalid price value: {}", e),
                        })?,
                    )
                }
            };

            rows.push((date, pe_ratio, price));
        }

        rows.sort_by_key(|&(date, _, _)| date);
        Ok(rows)
    }
}

impl DirectoryPort for CsvAdapter {
    fn list_companies(&self) -> Result<Vec<Company>, PetraderError> {
        self.load_companies()
    }
}

impl RulePort for CsvAdapter {
    fn get_rule(&self, rule_id: i64) -> Result<ThresholdRule, PetraderError> {
        let path = self.rules_path();
        let content = fs::read_to_string(&path).map_err(|e| PetraderError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        for result in rdr.records() {
            let record = result.map_err(|e| PetraderError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let id: i64 = field(&record, 0, "id")
                .map_err(|reason| PetraderError::Database { reason })?
                .parse()
                .map_err(|e| PetraderError::Database {
                    reason: format!("invalid rule id: {}", e),
                })?;
            if id != rule_id {
                continue;
            }

            let buy_level = Decimal::from_str(
                field(&record, 1, "buy_level")
                    .map_err(|reason| PetraderError::Database { reason })?,
            )
            .map_err(|e| PetraderError::Database {
                reason: format!("invalid buy_level value: {}", e),
            })?;
            let sell_level = Decimal::from_str(
                field(&record, 2, "sell_level")
                    .map_err(|reason| PetraderError::Database { reason })?,
            )
            .map_err(|e| PetraderError::Database {
                reason: format!("invalid sell_level value: {}", e),
            })?;

            return Ok(ThresholdRule {
                buy_level,
                sell_level,
            });
        }

        Err(PetraderError::RuleNotFound { rule_id })
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_valuations(
        &self,
        company_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ValuationObservation>, PetraderError> {
        let rows = self.load_series(company_id)?;
        Ok(rows
            .into_iter()
            .filter(|&(date, _, _)| date >= start_date && date <= end_date)
            .map(|(date, pe_ratio, _)| ValuationObservation {
                company_id,
                date,
                pe_ratio,
            })
            .collect())
    }

    fn get_price(&self, company_id: i64, date: NaiveDate) -> Result<Decimal, PetraderError> {
        let rows = self.load_series(company_id)?;
        match rows.into_iter().find(|&(d, _, _)| d == date) {
            Some((_, _, Some(price))) => Ok(price),
            _ => Err(PetraderError::PriceUnavailable { company_id, date }),
        }
    }

    fn get_valuation_range(
        &self,
        company_id: i64,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PetraderError> {
        let rows = self.load_series(company_id)?;
        match (rows.first(), rows.last()) {
            (Some(&(min, _, _)), Some(&(max, _, _))) => Ok(Some((min, max, rows.len()))),
            _ => Ok(None),
        }
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str, String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {} column", name))
}
