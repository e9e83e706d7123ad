use std::collections::HashSet;

use serde::Deserialize;
use tracing::{info, warn};

use super::command::Command;
use super::models::{
    CommandStatus, ConversionOutcome, CreatedTarget, FailedHost, SkippedHost, Target,
};
use super::wire::{non_empty, Named};
use super::ScannerSession;
use crate::errors::VulnscanError;

#[derive(Debug, Deserialize)]
struct TargetsResponse {
    #[serde(rename = "target", default)]
    targets: Vec<WireTarget>,
}

#[derive(Debug, Deserialize)]
struct WireTarget {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    hosts: String,
    #[serde(default)]
    exclude_hosts: String,
    #[serde(default)]
    port_list: Option<Named>,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    modification_time: String,
}

impl From<WireTarget> for Target {
    fn from(t: WireTarget) -> Self {
        Target {
            id: t.id,
            name: t.name,
            comment: t.comment,
            hosts: t.hosts,
            exclude_hosts: t.exclude_hosts,
            port_list: t.port_list.and_then(|p| non_empty(p.name)),
            creation_time: t.creation_time,
            modification_time: t.modification_time,
        }
    }
}

#[derive(Debug, Default)]
pub struct NewTarget<'a> {
    pub name: &'a str,
    pub hosts: &'a [String],
    pub port_range: Option<&'a str>,
    pub port_list_id: Option<&'a str>,
    pub comment: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct TargetChanges<'a> {
    pub name: Option<&'a str>,
    pub hosts: Option<&'a [String]>,
    pub exclude_hosts: Option<&'a [String]>,
    pub port_list_id: Option<&'a str>,
    pub comment: Option<&'a str>,
}

/// A scanner host to turn into a target.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostEntry {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

impl ScannerSession {
    pub async fn get_targets(&mut self) -> Result<Vec<Target>, VulnscanError> {
        let resp: TargetsResponse = self
            .query(&Command::new("get_targets").attr("filter", "rows=-1"))
            .await?;
        Ok(resp.targets.into_iter().map(Target::from).collect())
    }

    pub async fn create_target(&mut self, target: &NewTarget<'_>) -> Result<String, VulnscanError> {
        let cmd = Command::new("create_target")
            .field("name", target.name)
            .field("hosts", target.hosts.join(","))
            .field_opt("port_range", target.port_range)
            .reference_opt("port_list", target.port_list_id)
            .field_opt("comment", target.comment);
        self.create(&cmd).await
    }

    pub async fn modify_target(
        &mut self,
        target_id: &str,
        changes: &TargetChanges<'_>,
    ) -> Result<CommandStatus, VulnscanError> {
        let cmd = Command::new("modify_target")
            .attr("target_id", target_id)
            .field_opt("name", changes.name)
            .field_opt("hosts", changes.hosts.map(|h| h.join(",")).as_deref())
            .field_opt("exclude_hosts", changes.exclude_hosts.map(|h| h.join(",")).as_deref())
            .reference_opt("port_list", changes.port_list_id)
            .field_opt("comment", changes.comment);
        self.execute(&cmd).await
    }

    pub async fn delete_target(&mut self, target_id: &str) -> Result<CommandStatus, VulnscanError> {
        self.execute(
            &Command::new("delete_target")
                .attr("target_id", target_id)
                .attr("ultimate", "0"),
        )
        .await
    }

    /// Creates one scanner target per host. Each host succeeds, is skipped, or fails on its own;
    /// nothing already created is rolled back.
    pub async fn convert_hosts_to_targets(
        &mut self,
        hosts: &[HostEntry],
        port_list_id: Option<&str>,
        port_range: Option<&str>,
    ) -> Result<ConversionOutcome, VulnscanError> {
        let mut existing: HashSet<String> = self
            .get_targets()
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();
        let mut outcome = ConversionOutcome::default();

        for host in hosts {
            let ip = host.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty());
            let Some(ip) = ip else {
                outcome.failed.push(FailedHost {
                    host: host.hostname.clone(),
                    error: "IP address is required for each host".into(),
                });
                continue;
            };

            let target_name = host
                .hostname
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .unwrap_or(ip)
                .to_string();

            if existing.contains(&target_name) {
                outcome.skipped.push(SkippedHost {
                    target_name,
                    reason: "Target already exists".into(),
                });
                continue;
            }

            let ips = [ip.to_string()];
            let new_target = NewTarget {
                name: &target_name,
                hosts: &ips,
                port_range,
                port_list_id,
                comment: None,
            };
            match self.create_target(&new_target).await {
                Ok(target_id) => {
                    info!(target = %target_name, id = %target_id, "Created scanner target from host");
                    existing.insert(target_name.clone());
                    outcome.created_targets.push(CreatedTarget { target_name, target_id });
                }
                Err(VulnscanError::Scanner { status, text }) => {
                    warn!(target = %target_name, status, "Scanner refused target");
                    outcome.failed.push(FailedHost {
                        host: Some(ip.to_string()),
                        error: text,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}
