use std::path::PathBuf;
use thiserror::Error;

/// Every way a wrap-and-upload run can fail. All variants are terminal for the invocation.
#[derive(Error, Debug)]
pub enum ProvenanceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed reading file {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway rejected the request with status {status}: {body}")]
    Upload { status: u16, body: String },

    #[error("Unexpected gateway response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used by the CLI to choose an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    File,
    Validation,
    Network,
    Upload,
    Internal,
}

impl ProvenanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvenanceError::Configuration(_) => ErrorKind::Configuration,
            ProvenanceError::FileNotFound(_) | ProvenanceError::FileRead { .. } => ErrorKind::File,
            ProvenanceError::Validation(_) => ErrorKind::Validation,
            ProvenanceError::Network(_) => ErrorKind::Network,
            ProvenanceError::Upload { .. } | ProvenanceError::UnexpectedResponse(_) => {
                ErrorKind::Upload
            }
            ProvenanceError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_message_carries_status_and_body() {
        let err = ProvenanceError::Upload {
            status: 500,
            body: "internal failure".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("internal failure"), "got: {msg}");
        assert_eq!(err.kind(), ErrorKind::Upload);
    }

    #[test]
    fn file_errors_share_a_kind() {
        let missing = ProvenanceError::FileNotFound(PathBuf::from("nope.txt"));
        let unreadable = ProvenanceError::FileRead {
            path: PathBuf::from("locked.txt"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(missing.kind(), ErrorKind::File);
        assert_eq!(unreadable.kind(), ErrorKind::File);
        assert!(missing.to_string().contains("nope.txt"));
    }
}
