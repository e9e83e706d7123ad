use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Status attributes of a forwarded command (start, stop, delete, modify...).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandStatus {
    pub status: String,
    pub status_text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub permissions: Vec<String>,
    pub creation_time: String,
    pub modification_time: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScannerUser {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub creation_time: String,
    pub modification_time: String,
    pub roles: Vec<RoleRef>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScannerInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanConfig {
    pub config_id: String,
    pub config_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortList {
    pub id: String,
    pub name: String,
    pub comment: String,
}

/// A host asset. Identifiers (ip, hostname, OS...) are flattened next to the id.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Host {
    pub id: String,
    #[serde(flatten)]
    pub identifiers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Target {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub hosts: String,
    pub exclude_hosts: String,
    pub port_list: Option<String>,
    pub creation_time: String,
    pub modification_time: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreatedTarget {
    pub target_name: String,
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedHost {
    pub target_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailedHost {
    pub host: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ConversionOutcome {
    pub created_targets: Vec<CreatedTarget>,
    pub skipped: Vec<SkippedHost>,
    pub failed: Vec<FailedHost>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LastReport {
    pub id: String,
    pub timestamp: String,
    pub scan_start: String,
    pub scan_end: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskDetail {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub owner: String,
    pub status: String,
    pub progress: String,
    pub report_count: String,
    pub creation_time: String,
    pub modification_time: String,
    pub last_report: LastReport,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: String,
    pub progress: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskAction {
    Start,
    Stop,
    Resume,
    Delete,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchItem {
    pub task_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskResult {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: String,
    pub description: String,
    pub cve_numbers: Vec<String>,
    pub severity: f64,
    pub threat: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportSummary {
    pub id: String,
    pub name: String,
    pub creation_time: String,
    pub modification_time: String,
    pub scan_run_status: String,
    pub vulns_count: i64,
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportResult {
    pub id: String,
    pub host: String,
    pub port: String,
    pub description: String,
    pub cve_numbers: Vec<String>,
    pub severity: f64,
    pub threat: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    #[serde(flatten)]
    pub summary: ReportSummary,
    pub results: Vec<ReportResult>,
}

impl Report {
    /// Highest result severity, 0 when there are no results.
    pub fn highest_severity(&self) -> f64 {
        self.results
            .iter()
            .map(|r| r.severity)
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportWithTask {
    pub id: String,
    pub name: String,
    pub creation_time: String,
    pub modification_time: String,
    pub vulns_count: i64,
    pub task_id: String,
    pub task_name: String,
    pub highest_severity: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Schedule {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub timezone: String,
    pub period: Option<String>,
    pub next_time: Option<String>,
    pub last_time: Option<String>,
    pub owner: String,
    pub creation_time: String,
    pub modification_time: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Alert {
    pub id: String,
    pub name: String,
    pub condition: String,
    pub event: String,
    pub method: String,
    pub comment: String,
    pub creation_time: String,
    pub modification_time: String,
}
