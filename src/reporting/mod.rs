//! Report export to CSV, XLSX and PDF, produced in memory.

pub mod csv;
pub mod pdf;
pub mod xlsx;

use std::fmt;
use std::str::FromStr;

use crate::errors::VulnscanError;
use crate::scanner::models::{Report, ReportResult};

pub const HEADERS: [&str; 7] = [
    "ID",
    "Host",
    "Port",
    "Description",
    "CVE Numbers",
    "Severity",
    "Threat",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn filename(&self, report_id: &str) -> String {
        format!("report_{}.{}", report_id, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = VulnscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(VulnscanError::Validation("Unsupported format".into())),
        }
    }
}

/// One result as the seven export columns.
pub(crate) fn row(result: &ReportResult) -> [String; 7] {
    [
        result.id.clone(),
        result.host.clone(),
        result.port.clone(),
        result.description.clone(),
        result.cve_numbers.join(", "),
        result.severity.to_string(),
        result.threat.clone(),
    ]
}

pub fn export_report(report: &Report, format: ExportFormat) -> Result<Vec<u8>, VulnscanError> {
    match format {
        ExportFormat::Csv => csv::generate(report),
        ExportFormat::Xlsx => xlsx::generate(report),
        ExportFormat::Pdf => pdf::generate(report),
    }
}
