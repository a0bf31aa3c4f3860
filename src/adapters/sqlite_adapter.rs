//! SQLite data adapter.
//!
//! Backs all three read ports from one database. Decimal columns are stored
//! as TEXT and parsed into `Decimal`, so stored values never round-trip
//! through binary floating point. The pool's connection timeout caps each
//! call; an expired checkout surfaces as a Database error and the
//! coordinator's skip path absorbs it for market-data calls.

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::company::Company;
use crate::domain::error::PetraderError;
use crate::domain::rule::ThresholdRule;
use crate::domain::valuation::ValuationObservation;
use crate::ports::config_port::ConfigPort;
use crate::ports::directory_port::DirectoryPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::rule_port::RulePort;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PetraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| PetraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;
        let timeout_ms = config.get_int("sqlite", "connection_timeout_ms", 5_000) as u64;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(Duration::from_millis(timeout_ms))
            .build(manager)
            .map_err(|e: r2d2::Error| PetraderError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, PetraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| PetraderError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, PetraderError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| PetraderError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), PetraderError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY,
                symbol TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS rules (
                id INTEGER PRIMARY KEY,
                buy_level TEXT NOT NULL,
                sell_level TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS valuations (
                company_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                pe_ratio TEXT NOT NULL,
                PRIMARY KEY (company_id, date)
            );
            CREATE TABLE IF NOT EXISTS prices (
                company_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                price TEXT NOT NULL,
                PRIMARY KEY (company_id, date)
            );
            CREATE INDEX IF NOT EXISTS idx_valuations_company ON valuations(company_id);
            CREATE INDEX IF NOT EXISTS idx_prices_company ON prices(company_id);",
        )
        .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_company(&self, company: &Company) -> Result<(), PetraderError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO companies (id, symbol) VALUES (?1, ?2)",
            params![company.id, company.symbol],
        )
        .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn insert_rule(&self, rule_id: i64, rule: &ThresholdRule) -> Result<(), PetraderError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO rules (id, buy_level, sell_level) VALUES (?1, ?2, ?3)",
            params![
                rule_id,
                rule.buy_level.to_string(),
                rule.sell_level.to_string()
            ],
        )
        .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn insert_valuations(
        &self,
        observations: &[ValuationObservation],
    ) -> Result<(), PetraderError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for obs in observations {
            tx.execute(
                "INSERT OR REPLACE INTO valuations (company_id, date, pe_ratio)
                 VALUES (?1, ?2, ?3)",
                params![
                    obs.company_id,
                    obs.date.format("%Y-%m-%d").to_string(),
                    obs.pe_ratio.to_string()
                ],
            )
            .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    pub fn insert_price(
        &self,
        company_id: i64,
        date: NaiveDate,
        price: Decimal,
    ) -> Result<(), PetraderError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO prices (company_id, date, price) VALUES (?1, ?2, ?3)",
            params![
                company_id,
                date.format("%Y-%m-%d").to_string(),
                price.to_string()
            ],
        )
        .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            raw.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn parse_stored_decimal(raw: &str) -> Result<Decimal, rusqlite::Error> {
    Decimal::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            raw.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl DirectoryPort for SqliteAdapter {
    fn list_companies(&self) -> Result<Vec<Company>, PetraderError> {
        let conn = self.conn().map_err(|e| PetraderError::Directory {
            reason: e.to_string(),
        })?;

        let mut stmt = conn
            .prepare("SELECT id, symbol FROM companies ORDER BY symbol")
            .map_err(|e: rusqlite::Error| PetraderError::Directory {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Company {
                    id: row.get(0)?,
                    symbol: row.get(1)?,
                })
            })
            .map_err(|e: rusqlite::Error| PetraderError::Directory {
                reason: e.to_string(),
            })?;

        let mut companies = Vec::new();
        for row in rows {
            companies.push(row.map_err(|e: rusqlite::Error| PetraderError::Directory {
                reason: e.to_string(),
            })?);
        }

        Ok(companies)
    }
}

impl RulePort for SqliteAdapter {
    fn get_rule(&self, rule_id: i64) -> Result<ThresholdRule, PetraderError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT buy_level, sell_level FROM rules WHERE id = ?1",
            params![rule_id],
            |row| {
                let buy_raw: String = row.get(0)?;
                let sell_raw: String = row.get(1)?;
                Ok(ThresholdRule {
                    buy_level: parse_stored_decimal(&buy_raw)?,
                    sell_level: parse_stored_decimal(&sell_raw)?,
                })
            },
        );

        match result {
            Ok(rule) => Ok(rule),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(PetraderError::RuleNotFound { rule_id })
            }
            Err(e) => Err(PetraderError::DatabaseQuery {
                reason: e.to_string(),
            }),
        }
    }
}

impl MarketDataPort for SqliteAdapter {
    fn fetch_valuations(
        &self,
        company_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ValuationObservation>, PetraderError> {
        let conn = self.conn()?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let mut stmt = conn
            .prepare(
                "SELECT date, pe_ratio FROM valuations
                 WHERE company_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![company_id, start_str, end_str], |row| {
                let date_raw: String = row.get(0)?;
                let ratio_raw: String = row.get(1)?;
                Ok(ValuationObservation {
                    company_id,
                    date: parse_stored_date(&date_raw)?,
                    pe_ratio: parse_stored_decimal(&ratio_raw)?,
                })
            })
            .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut observations = Vec::new();
        for row in rows {
            observations.push(row.map_err(|e: rusqlite::Error| {
                PetraderError::DatabaseQuery {
                    reason: e.to_string(),
                }
            })?);
        }

        Ok(observations)
    }

    fn get_price(&self, company_id: i64, date: NaiveDate) -> Result<Decimal, PetraderError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT price FROM prices WHERE company_id = ?1 AND date = ?2",
            params![company_id, date.format("%Y-%m-%d").to_string()],
            |row| {
                let raw: String = row.get(0)?;
                parse_stored_decimal(&raw)
            },
        );

        match result {
            Ok(price) => Ok(price),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(PetraderError::PriceUnavailable { company_id, date })
            }
            Err(e) => Err(PetraderError::DatabaseQuery {
                reason: e.to_string(),
            }),
        }
    }

    fn get_valuation_range(
        &self,
        company_id: i64,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PetraderError> {
        let conn = self.conn()?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM valuations WHERE company_id = ?1",
                params![company_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e: rusqlite::Error| PetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = NaiveDate::parse_from_str(&min_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| PetraderError::Database {
                        reason: e.to_string(),
                    },
                )?;
                let max = NaiveDate::parse_from_str(&max_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| PetraderError::Database {
                        reason: e.to_string(),
                    },
                )?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
