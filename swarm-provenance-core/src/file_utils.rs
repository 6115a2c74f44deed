//! Reading the file to wrap, plus the hashing and encoding helpers applied to its bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::ProvenanceError;

/// Raw content of a local file together with the attributes the provenance record needs.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Base name of the file.
    pub name: String,
    pub size_bytes: u64,
    pub content: Vec<u8>,
}

/// Reads a regular file from disk without modifying it.
pub fn read_source_file<P: AsRef<Path>>(path: P) -> Result<SourceFile, ProvenanceError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading source file");

    let file_meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            error!(path = %path.display(), "Source file does not exist");
            return Err(ProvenanceError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            error!(path = %path.display(), error = ?e, "Failed to stat source file");
            return Err(ProvenanceError::FileRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if !file_meta.is_file() {
        error!(path = %path.display(), "Source path is not a regular file");
        return Err(ProvenanceError::FileNotFound(path.to_path_buf()));
    }

    let content = fs::read(path).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to read source file");
        ProvenanceError::FileRead {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!(path = %path.display(), size = content.len(), "Source file read");
    Ok(SourceFile {
        path: path.to_path_buf(),
        name,
        size_bytes: content.len() as u64,
        content,
    })
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}
