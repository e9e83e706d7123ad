use serde::Deserialize;
use tracing::warn;

use super::command::Command;
use super::models::{
    BatchItem, CommandStatus, LastReport, Task, TaskAction, TaskDetail, TaskResult, TaskStatus,
};
use super::wire::{extract_cves, or_default, parse_severity, port_number, MixedText};
use super::xml::{decode, ResponseStatus};
use super::ScannerSession;
use crate::errors::VulnscanError;

const NOT_AVAILABLE: &str = "Not available";

#[derive(Debug, Deserialize)]
struct TasksResponse {
    #[serde(rename = "task", default)]
    tasks: Vec<WireTask>,
}

#[derive(Debug, Deserialize)]
struct WireTask {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    progress: MixedText,
    #[serde(default)]
    report_count: MixedText,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    modification_time: String,
    #[serde(default)]
    last_report: Option<WireLastReport>,
}

#[derive(Debug, Default, Deserialize)]
struct Owner {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireLastReport {
    #[serde(default)]
    report: Option<WireLastReportBody>,
}

#[derive(Debug, Deserialize)]
struct WireLastReportBody {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    scan_start: String,
    #[serde(default)]
    scan_end: String,
}

impl From<WireTask> for TaskDetail {
    fn from(t: WireTask) -> Self {
        let last_report = match t.last_report.and_then(|l| l.report) {
            Some(r) => LastReport {
                id: or_default(r.id, NOT_AVAILABLE),
                timestamp: or_default(r.timestamp, NOT_AVAILABLE),
                scan_start: or_default(r.scan_start, NOT_AVAILABLE),
                scan_end: or_default(r.scan_end, NOT_AVAILABLE),
            },
            None => LastReport {
                id: NOT_AVAILABLE.into(),
                timestamp: NOT_AVAILABLE.into(),
                scan_start: NOT_AVAILABLE.into(),
                scan_end: NOT_AVAILABLE.into(),
            },
        };
        TaskDetail {
            id: t.id,
            name: or_default(t.name, NOT_AVAILABLE),
            comment: or_default(t.comment, NOT_AVAILABLE),
            owner: or_default(t.owner.unwrap_or_default().name, NOT_AVAILABLE),
            status: or_default(t.status, NOT_AVAILABLE),
            progress: or_default(t.progress.text, NOT_AVAILABLE),
            report_count: or_default(t.report_count.text, NOT_AVAILABLE),
            creation_time: or_default(t.creation_time, NOT_AVAILABLE),
            modification_time: or_default(t.modification_time, NOT_AVAILABLE),
            last_report,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    #[serde(rename = "result", default)]
    results: Vec<WireResult>,
}

/// A `<result>` element, shared by `get_results` and detailed `get_reports`.
#[derive(Debug, Deserialize)]
pub(crate) struct WireResult {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: MixedText,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub threat: String,
    #[serde(default)]
    pub nvt: Option<WireNvt>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireNvt {
    #[serde(default)]
    refs: Option<WireRefs>,
}

#[derive(Debug, Deserialize)]
struct WireRefs {
    #[serde(rename = "ref", default)]
    refs: Vec<WireRef>,
}

#[derive(Debug, Deserialize)]
struct WireRef {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "@id", default)]
    id: String,
}

impl WireResult {
    /// CVEs named in the description, followed by any extra CVE refs on the NVT.
    pub(crate) fn cve_numbers(&self) -> Vec<String> {
        let mut cves = extract_cves(&self.description);
        let refs = self
            .nvt
            .as_ref()
            .and_then(|n| n.refs.as_ref())
            .map(|r| r.refs.as_slice())
            .unwrap_or_default();
        for r in refs {
            if r.kind.eq_ignore_ascii_case("cve") && !cves.contains(&r.id) {
                cves.push(r.id.clone());
            }
        }
        cves
    }
}

impl From<WireResult> for TaskResult {
    fn from(r: WireResult) -> Self {
        let cve_numbers = r.cve_numbers();
        TaskResult {
            id: or_default(r.id, "N/A"),
            name: or_default(r.name, "N/A"),
            host: r.host.text.trim().to_string(),
            port: port_number(&r.port),
            description: or_default(r.description, "N/A"),
            cve_numbers,
            severity: parse_severity(&r.severity),
            threat: r.threat.trim().to_string(),
        }
    }
}

/// Fields for `create_task` / `modify_task`.
#[derive(Debug, Default)]
pub struct TaskSpec<'a> {
    pub name: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub target_id: Option<&'a str>,
    pub config_id: Option<&'a str>,
    pub scanner_id: Option<&'a str>,
    pub schedule_id: Option<&'a str>,
    pub alert_ids: &'a [String],
}

impl TaskSpec<'_> {
    fn apply(&self, mut cmd: Command) -> Command {
        cmd = cmd
            .field_opt("name", self.name)
            .field_opt("comment", self.comment)
            .reference_opt("config", self.config_id)
            .reference_opt("target", self.target_id)
            .reference_opt("scanner", self.scanner_id)
            .reference_opt("schedule", self.schedule_id);
        for alert in self.alert_ids {
            cmd = cmd.reference("alert", alert);
        }
        cmd
    }
}

impl TaskAction {
    fn command(&self) -> &'static str {
        match self {
            TaskAction::Start => "start_task",
            TaskAction::Stop => "stop_task",
            TaskAction::Resume => "resume_task",
            TaskAction::Delete => "delete_task",
        }
    }
}

impl ScannerSession {
    pub async fn get_tasks(&mut self) -> Result<Vec<Task>, VulnscanError> {
        let resp: TasksResponse = self
            .query(&Command::new("get_tasks").attr("filter", "rows=-1"))
            .await?;
        Ok(resp
            .tasks
            .into_iter()
            .map(|t| Task {
                id: or_default(t.id, "N/A"),
                name: or_default(t.name, "N/A"),
                status: or_default(t.status, "N/A"),
            })
            .collect())
    }

    async fn fetch_task(&mut self, task_id: &str, details: bool) -> Result<(WireTask, String), VulnscanError> {
        let mut cmd = Command::new("get_tasks").attr("task_id", task_id);
        if details {
            cmd = cmd.attr("details", "1");
        }
        let response = self.request(&cmd).await?;
        let status: ResponseStatus = decode(&response)?;
        let tasks: TasksResponse = decode(&response)?;
        let task = tasks
            .tasks
            .into_iter()
            .next()
            .ok_or_else(|| VulnscanError::NotFound("Task not found".into()))?;
        Ok((task, status.status_text))
    }

    pub async fn get_task(&mut self, task_id: &str) -> Result<TaskDetail, VulnscanError> {
        let (task, _) = self.fetch_task(task_id, true).await?;
        Ok(TaskDetail::from(task))
    }

    pub async fn get_task_status(&mut self, task_id: &str) -> Result<TaskStatus, VulnscanError> {
        let (task, message) = self.fetch_task(task_id, false).await?;
        Ok(TaskStatus {
            task_id: task_id.to_string(),
            status: or_default(task.status, "unknown"),
            progress: or_default(task.progress.text, "unknown"),
            message,
        })
    }

    pub async fn create_task(&mut self, spec: &TaskSpec<'_>) -> Result<String, VulnscanError> {
        self.create(&spec.apply(Command::new("create_task"))).await
    }

    pub async fn modify_task(&mut self, task_id: &str, spec: &TaskSpec<'_>) -> Result<CommandStatus, VulnscanError> {
        self.execute(&spec.apply(Command::new("modify_task").attr("task_id", task_id)))
            .await
    }

    pub async fn task_action(&mut self, action: TaskAction, task_id: &str) -> Result<CommandStatus, VulnscanError> {
        let mut cmd = Command::new(action.command()).attr("task_id", task_id);
        if action == TaskAction::Delete {
            cmd = cmd.attr("ultimate", "0");
        }
        self.execute(&cmd).await
    }

    /// Runs `action` for each id on this session; one failure does not stop the rest.
    pub async fn batch_tasks(
        &mut self,
        action: TaskAction,
        task_ids: &[String],
    ) -> Result<Vec<BatchItem>, VulnscanError> {
        let mut items = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            let item = match self.task_action(action, task_id).await {
                Ok(status) => BatchItem {
                    task_id: task_id.clone(),
                    ok: true,
                    status: Some(status.status),
                    status_text: Some(status.status_text),
                    error: None,
                },
                Err(e @ VulnscanError::Scanner { .. }) => {
                    warn!(task_id = %task_id, error = %e, "Batch item failed");
                    BatchItem {
                        task_id: task_id.clone(),
                        ok: false,
                        status: None,
                        status_text: None,
                        error: Some(e.to_string()),
                    }
                }
                Err(e) => return Err(e),
            };
            items.push(item);
        }
        Ok(items)
    }

    pub async fn get_results(&mut self, task_id: &str) -> Result<Vec<TaskResult>, VulnscanError> {
        let resp: ResultsResponse = self
            .query(
                &Command::new("get_results")
                    .attr("task_id", task_id)
                    .attr("filter", "rows=-1"),
            )
            .await?;
        Ok(resp.results.into_iter().map(TaskResult::from).collect())
    }
}
