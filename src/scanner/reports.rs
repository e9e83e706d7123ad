use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use super::command::Command;
use super::models::{CommandStatus, Report, ReportResult, ReportSummary, ReportWithTask};
use super::tasks::WireResult;
use super::wire::{or_default, parse_severity, port_number, Count, Named};
use super::ScannerSession;
use crate::errors::VulnscanError;

#[derive(Debug, Deserialize)]
struct ReportsResponse {
    #[serde(rename = "report", default)]
    reports: Vec<WireReport>,
}

/// The outer `<report>` carries metadata; the nested `<report>` carries scan content.
#[derive(Debug, Deserialize)]
struct WireReport {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    modification_time: String,
    #[serde(default)]
    task: Option<Named>,
    #[serde(default)]
    report: Option<WireReportBody>,
}

#[derive(Debug, Deserialize)]
struct WireReportBody {
    #[serde(default)]
    task: Option<Named>,
    #[serde(default)]
    scan_run_status: String,
    #[serde(default)]
    vulns: Option<Count>,
    #[serde(default)]
    results: Option<WireResults>,
}

#[derive(Debug, Deserialize)]
struct WireResults {
    #[serde(rename = "result", default)]
    results: Vec<WireResult>,
}

impl WireReport {
    fn summary(&self) -> ReportSummary {
        let body = self.report.as_ref();
        let task_id = self
            .task
            .as_ref()
            .or_else(|| body.and_then(|b| b.task.as_ref()))
            .map(|t| t.id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "N/A".to_string());
        ReportSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            creation_time: self.creation_time.clone(),
            modification_time: self.modification_time.clone(),
            scan_run_status: body.map(|b| b.scan_run_status.clone()).unwrap_or_default(),
            vulns_count: body
                .and_then(|b| b.vulns.as_ref())
                .and_then(|v| v.count.trim().parse().ok())
                .unwrap_or(0),
            task_id,
        }
    }

    fn into_report(self) -> Report {
        let summary = self.summary();
        let results = self
            .report
            .and_then(|b| b.results)
            .map(|r| r.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                let cve_numbers = r.cve_numbers();
                ReportResult {
                    id: r.id,
                    host: r.host.text.trim().to_string(),
                    port: port_number(&r.port),
                    description: r.description,
                    cve_numbers,
                    severity: parse_severity(&r.severity),
                    threat: r.threat.trim().to_string(),
                }
            })
            .collect();
        Report { summary, results }
    }
}

/// Collapses duplicate report ids, keeping the first entry that has a name.
fn dedupe_reports(reports: Vec<ReportSummary>) -> Vec<ReportSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, ReportSummary> = HashMap::new();
    for report in reports {
        match by_id.get(&report.id) {
            Some(existing) if existing.name.is_empty() && !report.name.is_empty() => {
                by_id.insert(report.id.clone(), report);
            }
            Some(_) => {}
            None => {
                order.push(report.id.clone());
                by_id.insert(report.id.clone(), report);
            }
        }
    }
    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}

impl ScannerSession {
    pub async fn get_reports(&mut self) -> Result<Vec<ReportSummary>, VulnscanError> {
        let resp: ReportsResponse = self
            .query(&Command::new("get_reports").attr("filter", "rows=-1"))
            .await?;
        Ok(resp.reports.iter().map(WireReport::summary).collect())
    }

    pub async fn get_report(&mut self, report_id: &str) -> Result<Report, VulnscanError> {
        let resp: ReportsResponse = self
            .query(
                &Command::new("get_reports")
                    .attr("report_id", report_id)
                    .attr("details", "1")
                    .attr("ignore_pagination", "1")
                    .attr("filter", "rows=-1"),
            )
            .await?;
        resp.reports
            .into_iter()
            .find(|r| r.id == report_id)
            .map(WireReport::into_report)
            .ok_or_else(|| VulnscanError::NotFound("Report not found".into()))
    }

    pub async fn delete_report(&mut self, report_id: &str) -> Result<CommandStatus, VulnscanError> {
        self.execute(&Command::new("delete_report").attr("report_id", report_id))
            .await
    }

    /// Reports annotated with their task name and highest result severity.
    pub async fn get_reports_with_tasks(&mut self) -> Result<Vec<ReportWithTask>, VulnscanError> {
        let reports = dedupe_reports(self.get_reports().await?);
        let task_names: HashMap<String, String> = self
            .get_tasks()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        let mut annotated = Vec::with_capacity(reports.len());
        for summary in reports {
            let highest_severity = self.get_report(&summary.id).await?.highest_severity();
            debug!(report = %summary.id, highest_severity, "Annotated report");
            annotated.push(ReportWithTask {
                task_name: task_names
                    .get(&summary.task_id)
                    .cloned()
                    .map(|n| or_default(n, "Not available"))
                    .unwrap_or_else(|| "Not available".to_string()),
                id: summary.id,
                name: summary.name,
                creation_time: summary.creation_time,
                modification_time: summary.modification_time,
                vulns_count: summary.vulns_count,
                task_id: summary.task_id,
                highest_severity,
            });
        }
        Ok(annotated)
    }
}
