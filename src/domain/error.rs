//! Domain error types.
//!
//! Two classes matter to callers: request-fatal errors (validation, unknown
//! rule, directory unavailable, empty universe) abort before any simulation
//! starts; per-company errors are absorbed at the coordinator boundary and
//! the affected company keeps its untouched allocation.

use chrono::NaiveDate;

/// Top-level error type for petrader.
#[derive(Debug, thiserror::Error)]
pub enum PetraderError {
    #[error("invalid request: {reason}")]
    Validation { reason: String },

    #[error("rule {rule_id} not found")]
    RuleNotFound { rule_id: i64 },

    #[error("company directory unavailable: {reason}")]
    Directory { reason: String },

    #[error("no companies to simulate")]
    EmptyUniverse,

    #[error("data error for company {company_id}: {reason}")]
    CompanyData { company_id: i64, reason: String },

    #[error("price unavailable for company {company_id} on {date}")]
    PriceUnavailable { company_id: i64, date: NaiveDate },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PetraderError {
    /// Errors the coordinator recovers from by skipping one company.
    pub fn is_per_company(&self) -> bool {
        matches!(
            self,
            PetraderError::CompanyData { .. } | PetraderError::PriceUnavailable { .. }
        )
    }
}

impl From<&PetraderError> for std::process::ExitCode {
    fn from(err: &PetraderError) -> Self {
        let code: u8 = match err {
            PetraderError::Io(_) => 1,
            PetraderError::ConfigParse { .. }
            | PetraderError::ConfigMissing { .. }
            | PetraderError::ConfigInvalid { .. }
            | PetraderError::Validation { .. } => 2,
            PetraderError::Database { .. } | PetraderError::DatabaseQuery { .. } => 3,
            PetraderError::RuleNotFound { .. } => 4,
            PetraderError::Directory { .. }
            | PetraderError::EmptyUniverse
            | PetraderError::CompanyData { .. }
            | PetraderError::PriceUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
