use thiserror::Error;

/// Failures loading a rate catalog from disk.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Rejections at the CLI/API boundary. The simulation core itself never fails.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("{field} {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
}

impl RequestError {
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        RequestError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
