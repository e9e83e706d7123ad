use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

use super::xml::ResponseFramer;
use crate::errors::VulnscanError;

const READ_CHUNK: usize = 16 * 1024;
/// Upper bound on a single GMP response.
pub const MAX_RESPONSE_BYTES: usize = 256 * 1024 * 1024;

/// A connected GMP channel: one XML command in, one XML response out.
#[async_trait]
pub trait GmpTransport: Send {
    async fn send(&mut self, command: &str) -> Result<String, VulnscanError>;
}

/// Opens a fresh transport for each scanner session.
#[async_trait]
pub trait ScannerConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn GmpTransport>, VulnscanError>;
}

pub struct UnixSocketConnector {
    path: PathBuf,
    max_response: usize,
}

impl UnixSocketConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), max_response: MAX_RESPONSE_BYTES }
    }

    pub fn with_max_response(mut self, bytes: usize) -> Self {
        self.max_response = bytes;
        self
    }
}

#[async_trait]
impl ScannerConnector for UnixSocketConnector {
    async fn connect(&self) -> Result<Box<dyn GmpTransport>, VulnscanError> {
        let stream = UnixStream::connect(&self.path).await.map_err(|e| {
            VulnscanError::Network(format!(
                "Failed to connect to scanner socket {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!(socket = %self.path.display(), "Connected to scanner");
        Ok(Box::new(UnixSocketTransport { stream, max_response: self.max_response }))
    }
}

struct UnixSocketTransport {
    stream: UnixStream,
    max_response: usize,
}

#[async_trait]
impl GmpTransport for UnixSocketTransport {
    async fn send(&mut self, command: &str) -> Result<String, VulnscanError> {
        self.stream
            .write_all(command.as_bytes())
            .await
            .map_err(|e| VulnscanError::Network(format!("Failed to write to scanner: {}", e)))?;

        let mut response = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        let mut framer = ResponseFramer::default();
        loop {
            let n = self
                .stream
                .read(&mut chunk)
                .await
                .map_err(|e| VulnscanError::Network(format!("Failed to read from scanner: {}", e)))?;
            if n == 0 {
                return Err(VulnscanError::Network(
                    "Scanner closed the connection mid-response".into(),
                ));
            }
            response.extend_from_slice(&chunk[..n]);
            if response.len() > self.max_response {
                return Err(VulnscanError::Network(format!(
                    "Scanner response exceeds {} bytes",
                    self.max_response
                )));
            }
            if framer.is_complete(&response) {
                break;
            }
        }

        String::from_utf8(response)
            .map_err(|e| VulnscanError::Xml(format!("Scanner response is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn test_unix_transport_reads_split_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvmd.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = sock.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"<get_version/>");
            sock.write_all(b"<get_version_response status=\"200\" ").await.unwrap();
            sock.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            sock.write_all(b"status_text=\"OK\"><version>22.4</version></get_version_response>")
                .await
                .unwrap();
        });

        let connector = UnixSocketConnector::new(&path);
        let mut transport = connector.connect().await.unwrap();
        let response = transport.send("<get_version/>").await.unwrap();
        assert!(response.ends_with("</get_version_response>"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvmd.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            sock.read(&mut buf).await.unwrap();
            sock.write_all(b"<get_reports_response status=\"200\" status_text=\"OK\">").await.unwrap();
            let filler = vec![b'x'; 4096];
            // The client hangs up once over its limit, so later writes may fail.
            for _ in 0..4 {
                if sock.write_all(&filler).await.is_err() {
                    break;
                }
            }
        });

        let connector = UnixSocketConnector::new(&path).with_max_response(2048);
        let mut transport = connector.connect().await.unwrap();
        let err = transport.send("<get_reports/>").await.err().unwrap();
        assert!(matches!(err, VulnscanError::Network(ref m) if m.contains("exceeds 2048 bytes")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket_fails() {
        let connector = UnixSocketConnector::new("/nonexistent/gvmd.sock");
        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, VulnscanError::Network(_)));
    }
}
