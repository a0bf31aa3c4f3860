//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_backtest as run_backtest_engine, BacktestParams};
use crate::domain::company::sort_for_processing;
use crate::domain::config_validation::{parse_date, validate_backtest_config};
use crate::domain::error::PetraderError;
use crate::domain::report::BacktestReport;
use crate::ports::config_port::ConfigPort;
use crate::ports::directory_port::DirectoryPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::rule_port::RulePort;

#[derive(Parser, Debug)]
#[command(name = "petrader", about = "PE-ratio threshold rule backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and emit the JSON report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        rule_id: Option<i64>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the company universe in processing order
    ListCompanies {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the stored valuation range per company
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            rule_id,
            start_date,
            end_date,
            output,
        } => run_backtest(
            &config,
            rule_id,
            start_date.as_deref(),
            end_date.as_deref(),
            output.as_ref(),
        ),
        Command::ListCompanies { config } => run_list_companies(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Serve { config } => run_serve(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PetraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Data source behind the three read ports, resolved from config:
/// `[sqlite] path` wins, `[csv] path` is the fallback.
pub enum DataSource {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::adapters::sqlite_adapter::SqliteAdapter),
    Csv(CsvAdapter),
}

pub fn open_data_source(config: &dyn ConfigPort) -> Result<DataSource, PetraderError> {
    if config.get_string("sqlite", "path").is_some() {
        #[cfg(feature = "sqlite")]
        {
            let adapter = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
            return Ok(DataSource::Sqlite(adapter));
        }
        #[cfg(not(feature = "sqlite"))]
        return Err(PetraderError::ConfigInvalid {
            section: "sqlite".into(),
            key: "path".into(),
            reason: "built without the sqlite feature".into(),
        });
    }

    match config.get_string("csv", "path") {
        Some(path) => Ok(DataSource::Csv(CsvAdapter::new(PathBuf::from(path)))),
        None => Err(PetraderError::ConfigMissing {
            section: "csv".into(),
            key: "path".into(),
        }),
    }
}

impl DataSource {
    pub fn as_ports(&self) -> (&dyn RulePort, &dyn DirectoryPort, &dyn MarketDataPort) {
        match self {
            #[cfg(feature = "sqlite")]
            DataSource::Sqlite(a) => (a, a, a),
            DataSource::Csv(a) => (a, a, a),
        }
    }
}

pub const DEFAULT_INITIAL_CAPITAL: Decimal = dec!(10000000);

/// Resolve run parameters: CLI overrides win over `[backtest]` config keys.
pub fn build_backtest_params(
    adapter: &dyn ConfigPort,
    rule_id_override: Option<i64>,
    start_override: Option<&str>,
    end_override: Option<&str>,
) -> Result<BacktestParams, PetraderError> {
    let rule_id = match rule_id_override {
        Some(id) => id,
        None => {
            let raw = adapter.get_string("backtest", "rule_id").ok_or_else(|| {
                PetraderError::ConfigMissing {
                    section: "backtest".into(),
                    key: "rule_id".into(),
                }
            })?;
            raw.trim()
                .parse::<i64>()
                .map_err(|_| PetraderError::ConfigInvalid {
                    section: "backtest".into(),
                    key: "rule_id".into(),
                    reason: "rule_id must be an integer".into(),
                })?
        }
    };

    let start_config = adapter.get_string("backtest", "start_date");
    let end_config = adapter.get_string("backtest", "end_date");
    let start_date = parse_date(start_override.or(start_config.as_deref()), "start_date")?;
    let end_date = parse_date(end_override.or(end_config.as_deref()), "end_date")?;

    let initial_capital = match adapter.get_string("backtest", "initial_capital") {
        Some(raw) => {
            Decimal::from_str(raw.trim()).map_err(|_| PetraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "initial_capital".into(),
                reason: "initial_capital must be a decimal number".into(),
            })?
        }
        None => DEFAULT_INITIAL_CAPITAL,
    };

    let params = BacktestParams {
        rule_id,
        start_date,
        end_date,
        initial_capital,
    };
    params.validate()?;
    Ok(params)
}

fn run_backtest(
    config_path: &PathBuf,
    rule_id_override: Option<i64>,
    start_override: Option<&str>,
    end_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Resolve run parameters
    let params = match build_backtest_params(
        &adapter,
        rule_id_override,
        start_override,
        end_override,
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Open data source
    let source = match open_data_source(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Running backtest: rule {}, {} to {}, capital {}",
        params.rule_id, params.start_date, params.end_date, params.initial_capital,
    );

    // Stage 4: Run the engine
    let (rule_port, directory, market_data) = source.as_ports();
    let result = match run_backtest_engine(rule_port, directory, market_data, &params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "  {} trades, final balance {}, P/L {}%",
        result.trades.len(),
        result.final_total_balance,
        result.profit_loss_percentage,
    );

    // Stage 5: Emit the report
    let report = BacktestReport::from(&result);
    match output_path {
        Some(path) => {
            let path_str = path.display().to_string();
            if let Err(e) = JsonReportAdapter.write(&report, &path_str) {
                eprintln!("error: failed to write report: {e}");
                return (&e).into();
            }
            eprintln!("Report written to: {path_str}");
        }
        None => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize report: {e}");
                return ExitCode::from(1);
            }
        },
    }

    ExitCode::SUCCESS
}

fn run_list_companies(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let source = match open_data_source(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (_, directory, _) = source.as_ports();
    let mut companies = match directory.list_companies() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    sort_for_processing(&mut companies);

    for company in &companies {
        println!("{}\t{}", company.id, company.symbol);
    }

    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, symbol_filter: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let source = match open_data_source(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (_, directory, market_data) = source.as_ports();
    let mut companies = match directory.list_companies() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    sort_for_processing(&mut companies);

    if let Some(filter) = symbol_filter {
        companies.retain(|c| c.symbol == filter.to_uppercase());
        if companies.is_empty() {
            eprintln!("error: no company with symbol {filter}");
            return ExitCode::from(5);
        }
    }

    for company in &companies {
        match market_data.get_valuation_range(company.id) {
            Ok(Some((min, max, count))) => {
                println!(
                    "{}: {} observations, {} to {}",
                    company.symbol, count, min, max
                );
            }
            Ok(None) => println!("{}: no data", company.symbol),
            Err(e) => {
                eprintln!("warning: {} ({e})", company.symbol);
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Presence check only; no pool or file is opened here.
    if adapter.get_string("sqlite", "path").is_none()
        && adapter.get_string("csv", "path").is_none()
    {
        let err = PetraderError::ConfigMissing {
            section: "csv".into(),
            key: "path".into(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    eprintln!("Config validated successfully");
    ExitCode::SUCCESS
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::adapters::web::{build_router, AppState};
        use std::net::SocketAddr;
        use std::sync::Arc;

        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let adapter = match SqliteAdapter::from_config(&config) {
            Ok(a) => Arc::new(a),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let initial_capital = match config.get_string("backtest", "initial_capital") {
            Some(raw) => match Decimal::from_str(raw.trim()) {
                Ok(v) if v > Decimal::ZERO => v,
                _ => {
                    eprintln!("error: invalid [backtest] initial_capital");
                    return ExitCode::from(2);
                }
            },
            None => DEFAULT_INITIAL_CAPITAL,
        };

        let addr: SocketAddr = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:3000".parse().unwrap());

        eprintln!("Starting web server on {addr}");

        let state = AppState {
            rule_port: adapter.clone(),
            directory_port: adapter.clone(),
            market_data: adapter,
            initial_capital,
        };

        let router = build_router(state);

        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(async {
                let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
                axum::serve(listener, router).await.unwrap();
            });

        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
