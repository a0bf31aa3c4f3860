//! Configuration validation.
//!
//! Validates the `[backtest]` section once at the boundary, before any
//! collaborator is contacted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::error::PetraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), PetraderError> {
    validate_rule_id(config)?;
    validate_dates(config)?;
    validate_initial_capital(config)?;
    Ok(())
}

fn validate_rule_id(config: &dyn ConfigPort) -> Result<(), PetraderError> {
    let raw = config
        .get_string("backtest", "rule_id")
        .ok_or_else(|| PetraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "rule_id".to_string(),
        })?;
    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(()),
        Ok(_) => Err(PetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "rule_id".to_string(),
            reason: "rule_id must be positive".to_string(),
        }),
        Err(_) => Err(PetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "rule_id".to_string(),
            reason: "rule_id must be an integer".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PetraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    // A single-day window is legal; only inversion is rejected.
    if end_date < start_date {
        return Err(PetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, PetraderError> {
    match value {
        None => Err(PetraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| PetraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            })
        }
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), PetraderError> {
    // Optional key; the CLI falls back to its default when absent.
    let Some(raw) = config.get_string("backtest", "initial_capital") else {
        return Ok(());
    };
    match Decimal::from_str(raw.trim()) {
        Ok(value) if value > Decimal::ZERO => Ok(()),
        Ok(_) => Err(PetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        }),
        Err(_) => Err(PetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be a decimal number".to_string(),
        }),
    }
}
