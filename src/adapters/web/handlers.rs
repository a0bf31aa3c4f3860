//! HTTP request handlers for the web adapter.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::backtest::{run_backtest as run_backtest_engine, BacktestParams};
use crate::domain::company::sort_for_processing;
use crate::domain::report::BacktestReport;

use super::{AppState, WebError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub rule_id: i64,
    pub start_date: String,
    pub end_date: String,
}

/// POST /backtest: validate the request once at the boundary, run the
/// engine, return the report document unchanged.
pub async fn run_backtest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BacktestRequest>,
) -> Result<Json<BacktestReport>, WebError> {
    let start_date = parse_request_date(&request.start_date, "startDate")?;
    let end_date = parse_request_date(&request.end_date, "endDate")?;

    let params = BacktestParams {
        rule_id: request.rule_id,
        start_date,
        end_date,
        initial_capital: state.initial_capital,
    };

    let result = run_backtest_engine(
        &*state.rule_port,
        &*state.directory_port,
        &*state.market_data,
        &params,
    )?;

    Ok(Json(BacktestReport::from(&result)))
}

#[derive(Debug, Serialize)]
pub struct CompanyRow {
    pub id: i64,
    pub symbol: String,
}

/// GET /companies: the simulation universe in processing order.
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CompanyRow>>, WebError> {
    let mut companies = state.directory_port.list_companies()?;
    sort_for_processing(&mut companies);

    Ok(Json(
        companies
            .into_iter()
            .map(|c| CompanyRow {
                id: c.id,
                symbol: c.symbol,
            })
            .collect(),
    ))
}

fn parse_request_date(raw: &str, field: &str) -> Result<NaiveDate, WebError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| WebError::bad_request(format!("invalid {field}, expected YYYY-MM-DD")))
}
