use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ai::Finding;
use crate::errors::VulnscanError;
use crate::scanner::models::TaskAction;
use crate::scanner::schedules::{parse_dtstart, Frequency, Recurrence};
use crate::scanner::{AlertSpec, HostEntry, TaskSpec};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModifyUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupNameRequest {
    pub group_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddTargetRequest {
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromGroupRequest {
    pub target_id: Option<i64>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScannerUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModifyScannerUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub role_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CloneUserRequest {
    pub name: Option<String>,
    pub comment: Option<String>,
}

/// Hosts given either as `"a, b"` or as `["a", "b"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HostList {
    Joined(String),
    List(Vec<String>),
}

impl HostList {
    pub fn into_vec(self) -> Vec<String> {
        let items = match self {
            HostList::Joined(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
            HostList::List(v) => v,
        };
        items
            .into_iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTargetRequest {
    pub name: Option<String>,
    pub hosts: Option<HostList>,
    pub port_range: Option<String>,
    pub port_list_id: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModifyTargetRequest {
    pub name: Option<String>,
    pub hosts: Option<HostList>,
    pub exclude_hosts: Option<HostList>,
    pub port_list_id: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertHostsRequest {
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
    pub port_list_id: Option<String>,
    pub port_range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub target_id: Option<String>,
    pub config_id: Option<String>,
    pub scanner_id: Option<String>,
    pub schedule_id: Option<String>,
    #[serde(default)]
    pub alert_ids: Vec<String>,
}

impl TaskRequest {
    pub fn spec(&self) -> TaskSpec<'_> {
        TaskSpec {
            name: self.name.as_deref(),
            comment: self.comment.as_deref(),
            target_id: self.target_id.as_deref(),
            config_id: self.config_id.as_deref(),
            scanner_id: self.scanner_id.as_deref(),
            schedule_id: self.schedule_id.as_deref(),
            alert_ids: &self.alert_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchTasksRequest {
    pub action: TaskAction,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResultsRequest {
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub schedule_id: Option<String>,
    pub name: Option<String>,
    pub dtstart: Option<String>,
    pub timezone: Option<String>,
    pub comment: Option<String>,
    pub frequency: Option<String>,
    pub interval: Option<u32>,
    pub count: Option<u32>,
}

impl ScheduleRequest {
    /// The recurrence to render, or `None` when no `dtstart` was sent.
    pub fn recurrence(&self) -> Result<Option<Recurrence>, VulnscanError> {
        let Some(raw) = self.dtstart.as_deref() else {
            return Ok(None);
        };
        let frequency = match self.frequency.as_deref() {
            Some(f) => f.parse::<Frequency>()?,
            None => Frequency::Daily,
        };
        let interval = self.interval.unwrap_or(1);
        if interval == 0 {
            return Err(VulnscanError::Validation("interval must be at least 1".into()));
        }
        Ok(Some(Recurrence {
            dtstart: parse_dtstart(raw)?,
            frequency,
            interval,
            count: self.count.filter(|c| *c > 0),
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub alert_id: Option<String>,
    pub name: Option<String>,
    pub condition: Option<String>,
    pub event: Option<String>,
    pub method: Option<String>,
    pub condition_data: Option<BTreeMap<String, String>>,
    pub event_data: Option<BTreeMap<String, String>>,
    pub method_data: Option<BTreeMap<String, String>>,
    pub filter_id: Option<String>,
    pub comment: Option<String>,
}

impl AlertRequest {
    pub fn spec(&self) -> AlertSpec<'_> {
        AlertSpec {
            name: self.name.as_deref(),
            condition: self.condition.as_deref(),
            event: self.event.as_deref(),
            method: self.method.as_deref(),
            condition_data: self.condition_data.as_ref(),
            event_data: self.event_data.as_ref(),
            method_data: self.method_data.as_ref(),
            filter_id: self.filter_id.as_deref(),
            comment: self.comment.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub results: Vec<Finding>,
}
