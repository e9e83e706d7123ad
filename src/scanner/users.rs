use serde::Deserialize;

use super::command::Command;
use super::models::{CommandStatus, Role, RoleRef, ScannerUser};
use super::wire::{Named, or_default};
use super::ScannerSession;
use crate::errors::VulnscanError;

#[derive(Debug, Deserialize)]
struct RolesResponse {
    #[serde(rename = "role", default)]
    roles: Vec<WireRole>,
}

#[derive(Debug, Deserialize)]
struct WireRole {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    permissions: String,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    modification_time: String,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(rename = "user", default)]
    users: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    modification_time: String,
    #[serde(rename = "role", default)]
    roles: Vec<Named>,
}

impl From<WireUser> for ScannerUser {
    fn from(u: WireUser) -> Self {
        ScannerUser {
            id: u.id,
            name: u.name,
            comment: u.comment,
            creation_time: u.creation_time,
            modification_time: u.modification_time,
            roles: u
                .roles
                .into_iter()
                .map(|r| RoleRef { id: r.id, name: r.name })
                .collect(),
        }
    }
}

/// Fields for `create_user`; `None` leaves the scanner default.
#[derive(Debug, Default)]
pub struct UserSpec<'a> {
    pub name: &'a str,
    pub password: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub role_ids: &'a [String],
}

impl ScannerSession {
    pub async fn get_roles(&mut self) -> Result<Vec<Role>, VulnscanError> {
        let resp: RolesResponse = self
            .query(&Command::new("get_roles").attr("filter", "rows=-1"))
            .await?;
        Ok(resp
            .roles
            .into_iter()
            .map(|r| Role {
                id: r.id,
                name: r.name,
                comment: r.comment,
                permissions: r
                    .permissions
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect(),
                creation_time: r.creation_time,
                modification_time: r.modification_time,
            })
            .collect())
    }

    pub async fn get_users(&mut self) -> Result<Vec<ScannerUser>, VulnscanError> {
        let resp: UsersResponse = self
            .query(&Command::new("get_users").attr("filter", "rows=-1"))
            .await?;
        Ok(resp.users.into_iter().map(ScannerUser::from).collect())
    }

    pub async fn get_user(&mut self, user_id: &str) -> Result<ScannerUser, VulnscanError> {
        let resp: UsersResponse = self
            .query(&Command::new("get_users").attr("user_id", user_id))
            .await?;
        resp.users
            .into_iter()
            .find(|u| u.id == user_id)
            .map(ScannerUser::from)
            .ok_or_else(|| VulnscanError::NotFound("User not found".into()))
    }

    pub async fn create_user(&mut self, spec: &UserSpec<'_>) -> Result<String, VulnscanError> {
        let mut cmd = Command::new("create_user")
            .field("name", spec.name)
            .field_opt("password", spec.password)
            .field_opt("comment", spec.comment);
        for role in spec.role_ids {
            cmd = cmd.reference("role", role);
        }
        self.create(&cmd).await
    }

    pub async fn modify_user(
        &mut self,
        user_id: &str,
        new_name: Option<&str>,
        password: Option<&str>,
        role_ids: Option<&[String]>,
    ) -> Result<CommandStatus, VulnscanError> {
        let mut cmd = Command::new("modify_user")
            .attr("user_id", user_id)
            .field_opt("new_name", new_name)
            .field_opt("password", password);
        if let Some(roles) = role_ids {
            for role in roles {
                cmd = cmd.reference("role", role);
            }
        }
        self.execute(&cmd).await
    }

    pub async fn delete_user(&mut self, user_id: &str) -> Result<CommandStatus, VulnscanError> {
        self.execute(&Command::new("delete_user").attr("user_id", user_id))
            .await
    }

    /// Copies a scanner user. The clone is named `<original>_clone` unless `name` is given.
    pub async fn clone_user(
        &mut self,
        user_id: &str,
        name: Option<&str>,
        comment: Option<&str>,
    ) -> Result<(String, String), VulnscanError> {
        let original = self.get_user(user_id).await?;
        let clone_name = match name {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => format!("{}_clone", original.name),
        };
        let clone_comment = comment
            .map(String::from)
            .unwrap_or_else(|| or_default(original.comment, ""));

        let cmd = Command::new("create_user")
            .field("copy", user_id)
            .field("name", &clone_name)
            .field("comment", &clone_comment);
        let id = self.create(&cmd).await?;
        Ok((id, clone_name))
    }
}
