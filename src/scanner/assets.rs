use std::collections::BTreeMap;

use serde::Deserialize;

use super::command::Command;
use super::models::{CommandStatus, Host, PortList, ScanConfig, ScannerInfo};
use super::wire::{or_default, Named};
use super::ScannerSession;
use crate::errors::VulnscanError;

#[derive(Debug, Deserialize)]
struct ScannersResponse {
    #[serde(rename = "scanner", default)]
    scanners: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct ConfigsResponse {
    #[serde(rename = "config", default)]
    configs: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct PortListsResponse {
    #[serde(rename = "port_list", default)]
    port_lists: Vec<WirePortList>,
}

#[derive(Debug, Deserialize)]
struct WirePortList {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct AssetsResponse {
    #[serde(rename = "asset", default)]
    assets: Vec<WireAsset>,
}

#[derive(Debug, Deserialize)]
struct WireAsset {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    identifiers: Option<Identifiers>,
}

#[derive(Debug, Deserialize)]
struct Identifiers {
    #[serde(rename = "identifier", default)]
    items: Vec<Identifier>,
}

#[derive(Debug, Deserialize)]
struct Identifier {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

impl From<WireAsset> for Host {
    fn from(asset: WireAsset) -> Self {
        let mut identifiers = BTreeMap::new();
        for ident in asset.identifiers.map(|i| i.items).unwrap_or_default() {
            let (name, value) = (ident.name.trim(), ident.value.trim());
            if !name.is_empty() && !value.is_empty() && name != "id" {
                identifiers.insert(name.to_string(), value.to_string());
            }
        }
        Host { id: asset.id, identifiers }
    }
}

impl ScannerSession {
    pub async fn get_scanners(&mut self) -> Result<Vec<ScannerInfo>, VulnscanError> {
        let resp: ScannersResponse = self.query(&Command::new("get_scanners")).await?;
        Ok(resp
            .scanners
            .into_iter()
            .map(|s| ScannerInfo { id: s.id, name: s.name })
            .collect())
    }

    pub async fn get_configs(&mut self) -> Result<Vec<ScanConfig>, VulnscanError> {
        let resp: ConfigsResponse = self
            .query(&Command::new("get_configs").attr("filter", "rows=-1"))
            .await?;
        Ok(resp
            .configs
            .into_iter()
            .map(|c| ScanConfig { config_id: c.id, config_name: c.name })
            .collect())
    }

    pub async fn get_port_lists(&mut self) -> Result<Vec<PortList>, VulnscanError> {
        let resp: PortListsResponse = self
            .query(&Command::new("get_port_lists").attr("filter", "rows=-1"))
            .await?;
        Ok(resp
            .port_lists
            .into_iter()
            .map(|p| PortList {
                id: or_default(p.id, "N/A"),
                name: or_default(p.name, "N/A"),
                comment: or_default(p.comment, "No comment"),
            })
            .collect())
    }

    pub async fn get_hosts(&mut self) -> Result<Vec<Host>, VulnscanError> {
        let resp: AssetsResponse = self
            .query(
                &Command::new("get_assets")
                    .attr("type", "host")
                    .attr("filter", "rows=-1"),
            )
            .await?;
        Ok(resp.assets.into_iter().map(Host::from).collect())
    }

    pub async fn delete_host(&mut self, host_id: &str) -> Result<CommandStatus, VulnscanError> {
        self.execute(&Command::new("delete_asset").attr("asset_id", host_id))
            .await
    }
}
