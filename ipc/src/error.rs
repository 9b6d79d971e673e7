use thiserror::Error;

/// Errors shared by every consumer of a state-file directory.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("io error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed state file {path}: {source}")]
    SchemaInvalid {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl IpcError {
    pub fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        IpcError::Io { path: path.into(), source }
    }
}
