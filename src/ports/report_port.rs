//! Report output port trait.

use crate::domain::error::PetraderError;
use crate::domain::report::BacktestReport;

/// Port for writing the finished simulation report.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport, output_path: &str) -> Result<(), PetraderError>;
}
