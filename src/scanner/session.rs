use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::command::Command;
use super::models::CommandStatus;
use super::transport::{GmpTransport, ScannerConnector};
use super::xml::{decode, ResponseStatus};
use crate::errors::VulnscanError;

/// An authenticated GMP session. Lives for one request; the socket closes on drop.
pub struct ScannerSession {
    transport: Box<dyn GmpTransport>,
}

impl ScannerSession {
    /// Connects and authenticates with the configured scanner account.
    pub async fn open(
        connector: &dyn ScannerConnector,
        username: &str,
        password: &str,
    ) -> Result<Self, VulnscanError> {
        let transport = connector.connect().await?;
        let mut session = Self { transport };
        session.authenticate(username, password).await?;
        Ok(session)
    }

    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), VulnscanError> {
        let cmd = Command::new("authenticate").child(
            Command::new("credentials")
                .field("username", username)
                .field("password", password),
        );
        self.request(&cmd).await?;
        debug!(username = %username, "Authenticated with scanner");
        Ok(())
    }

    /// Sends `cmd` and returns the raw response, failing on a non-2xx status.
    pub(crate) async fn request(&mut self, cmd: &Command) -> Result<String, VulnscanError> {
        debug!(command = cmd.name(), "Sending GMP command");
        let response = self.transport.send(&cmd.build()).await?;
        let status = parse_status(&response)?;
        if !(200..300).contains(&status.0) {
            warn!(command = cmd.name(), status = status.0, text = %status.1, "Scanner rejected command");
            return Err(VulnscanError::Scanner {
                status: status.0,
                text: status.1,
            });
        }
        Ok(response)
    }

    /// Sends `cmd` and decodes the response into `T`.
    pub(crate) async fn query<T: DeserializeOwned>(&mut self, cmd: &Command) -> Result<T, VulnscanError> {
        let response = self.request(cmd).await?;
        decode(&response)
    }

    /// Sends `cmd` and returns the response's status attributes.
    pub(crate) async fn execute(&mut self, cmd: &Command) -> Result<CommandStatus, VulnscanError> {
        let response = self.request(cmd).await?;
        let status: ResponseStatus = decode(&response)?;
        Ok(CommandStatus {
            status: status.status,
            status_text: status.status_text,
        })
    }

    /// Sends a `create_*` command and returns the id of the new resource.
    pub(crate) async fn create(&mut self, cmd: &Command) -> Result<String, VulnscanError> {
        let response = self.request(cmd).await?;
        let status: ResponseStatus = decode(&response)?;
        status.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            VulnscanError::Xml(format!("{} response carried no id", cmd.name()))
        })
    }
}

fn parse_status(response: &str) -> Result<(u16, String), VulnscanError> {
    let status: ResponseStatus = decode(response)?;
    let code = status
        .status
        .parse::<u16>()
        .map_err(|_| VulnscanError::Xml(format!("Invalid response status '{}'", status.status)))?;
    Ok((code, status.status_text))
}
