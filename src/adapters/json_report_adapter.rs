//! JSON report adapter.

use std::fs;

use crate::domain::error::PetraderError;
use crate::domain::report::BacktestReport;
use crate::ports::report_port::ReportPort;

/// Writes the response document, pretty-printed, to a file.
pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &str) -> Result<(), PetraderError> {
        let json = serde_json::to_string_pretty(report).map_err(|e| PetraderError::Validation {
            reason: format!("failed to serialize report: {}", e),
        })?;
        fs::write(output_path, json)?;
        Ok(())
    }
}
