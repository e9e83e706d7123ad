use std::collections::BTreeMap;

use serde::Deserialize;

use super::command::Command;
use super::models::{Alert, CommandStatus};
use super::wire::MixedText;
use super::ScannerSession;
use crate::errors::VulnscanError;

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(rename = "alert", default)]
    alerts: Vec<WireAlert>,
}

#[derive(Debug, Deserialize)]
struct WireAlert {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    condition: MixedText,
    #[serde(default)]
    event: MixedText,
    #[serde(default)]
    method: MixedText,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    modification_time: String,
}

impl From<WireAlert> for Alert {
    fn from(a: WireAlert) -> Self {
        Alert {
            id: a.id,
            name: a.name,
            condition: a.condition.text.trim().to_string(),
            event: a.event.text.trim().to_string(),
            method: a.method.text.trim().to_string(),
            comment: a.comment,
            creation_time: a.creation_time,
            modification_time: a.modification_time,
        }
    }
}

/// Fields for `create_alert` / `modify_alert`. Each `*_data` map becomes `<data>value<name>key</name></data>`.
#[derive(Debug, Default)]
pub struct AlertSpec<'a> {
    pub name: Option<&'a str>,
    pub condition: Option<&'a str>,
    pub event: Option<&'a str>,
    pub method: Option<&'a str>,
    pub condition_data: Option<&'a BTreeMap<String, String>>,
    pub event_data: Option<&'a BTreeMap<String, String>>,
    pub method_data: Option<&'a BTreeMap<String, String>>,
    pub filter_id: Option<&'a str>,
    pub comment: Option<&'a str>,
}

fn with_data(name: &str, value: &str, data: Option<&BTreeMap<String, String>>) -> Command {
    let mut cmd = Command::new(name).text(value);
    for (key, val) in data.into_iter().flatten() {
        cmd = cmd.child(Command::new("data").text(val).field("name", key));
    }
    cmd
}

impl AlertSpec<'_> {
    fn apply(&self, mut cmd: Command) -> Command {
        cmd = cmd
            .field_opt("name", self.name)
            .field_opt("comment", self.comment);
        if let Some(condition) = self.condition {
            cmd = cmd.child(with_data("condition", condition, self.condition_data));
        }
        if let Some(event) = self.event {
            cmd = cmd.child(with_data("event", event, self.event_data));
        }
        if let Some(method) = self.method {
            cmd = cmd.child(with_data("method", method, self.method_data));
        }
        cmd.reference_opt("filter", self.filter_id)
    }
}

impl ScannerSession {
    pub async fn get_alerts(&mut self) -> Result<Vec<Alert>, VulnscanError> {
        let resp: AlertsResponse = self
            .query(&Command::new("get_alerts").attr("filter", "rows=-1"))
            .await?;
        Ok(resp.alerts.into_iter().map(Alert::from).collect())
    }

    pub async fn create_alert(&mut self, spec: &AlertSpec<'_>) -> Result<String, VulnscanError> {
        self.create(&spec.apply(Command::new("create_alert"))).await
    }

    pub async fn modify_alert(&mut self, alert_id: &str, spec: &AlertSpec<'_>) -> Result<CommandStatus, VulnscanError> {
        self.execute(&spec.apply(Command::new("modify_alert").attr("alert_id", alert_id)))
            .await
    }

    pub async fn delete_alert(&mut self, alert_id: &str) -> Result<CommandStatus, VulnscanError> {
        self.execute(
            &Command::new("delete_alert")
                .attr("alert_id", alert_id)
                .attr("ultimate", "0"),
        )
        .await
    }
}
