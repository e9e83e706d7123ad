use thiserror::Error;

#[derive(Debug, Error)]
pub enum VulnscanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    /// A GMP response carried a non-2xx status.
    #[error("Error {status}: {text}")]
    Scanner { status: u16, text: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for VulnscanError {
    fn from(e: rusqlite::Error) -> Self {
        VulnscanError::Database(e.to_string())
    }
}

impl From<quick_xml::Error> for VulnscanError {
    fn from(e: quick_xml::Error) -> Self {
        VulnscanError::Xml(e.to_string())
    }
}
