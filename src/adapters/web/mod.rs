//! Web server adapter.
//!
//! Axum JSON boundary for the simulation engine: a backtest request comes
//! in, the report document goes out. Collaborators are injected through the
//! shared state, so handler tests run against in-memory ports.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::ports::directory_port::DirectoryPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::rule_port::RulePort;

pub struct AppState {
    pub rule_port: Arc<dyn RulePort + Send + Sync>,
    pub directory_port: Arc<dyn DirectoryPort + Send + Sync>,
    pub market_data: Arc<dyn MarketDataPort + Send + Sync>,
    /// Total starting capital applied to every run; requests carry only the
    /// rule and the window.
    pub initial_capital: Decimal,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/backtest", post(handlers::run_backtest))
        .route("/companies", get(handlers::list_companies))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
