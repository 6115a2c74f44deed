//! # metadata: the provenance record and the payload uploaded to Swarm
//!
//! A [`ProvenanceRecord`] describes where a file came from: which provenance standard the
//! content follows, the file's name, size and SHA-256 hash, when it was wrapped, and any
//! caller-supplied key/value pairs. [`UploadBundle`] pairs the record with the raw bytes, and
//! [`UploadBundle::to_payload`] renders both as the single JSON object the gateway stores:
//!
//! ```json
//! {"data":"<base64>","stamp_id":"<batch>","standard":"PROV-O","filename":"a.csv",
//!  "size_bytes":3,"created_at":"2026-10-19T12:00:00Z","content_hash":"<sha256>"}
//! ```
//!
//! Extra fields are flattened into the top level of that object, so their keys may never shadow
//! one of [`RESERVED_FIELDS`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use crate::config::GatewayConfig;
use crate::error::ProvenanceError;
use crate::file_utils::{base64_encode, sha256_hex, SourceFile};

/// Keys owned by the payload envelope.
pub const RESERVED_FIELDS: &[&str] = &[
    "standard",
    "filename",
    "size_bytes",
    "created_at",
    "content_hash",
    "encryption",
    "data",
    "stamp_id",
];

/// Used to size the payload before a real stamp exists; same length as a batch id.
pub const PLACEHOLDER_STAMP_ID: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

pub type ExtraFields = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub standard: String,
    pub filename: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
    #[serde(flatten)]
    pub extra_fields: ExtraFields,
}

/// Caller choices that shape a record beyond what the file and configuration dictate.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Overrides the configured default standard.
    pub standard: Option<String>,
    pub encryption: Option<String>,
    pub extra_fields: ExtraFields,
}

/// Builds a record stamped with the current time.
pub fn build_record(
    source: &SourceFile,
    config: &GatewayConfig,
    options: &RecordOptions,
) -> Result<ProvenanceRecord, ProvenanceError> {
    build_record_at(source, config, options, Utc::now())
}

/// Builds a record stamped with `now`, truncated to whole seconds.
pub fn build_record_at(
    source: &SourceFile,
    config: &GatewayConfig,
    options: &RecordOptions,
    now: DateTime<Utc>,
) -> Result<ProvenanceRecord, ProvenanceError> {
    validate_extra_keys(&options.extra_fields)?;

    let standard = match options.standard.as_deref() {
        Some(s) if s.trim().is_empty() => {
            return Err(ProvenanceError::Validation(
                "Provenance standard must not be empty".to_string(),
            ))
        }
        Some(s) => s.trim().to_string(),
        None => config.default_standard.clone(),
    };
    if source.name.is_empty() {
        return Err(ProvenanceError::Validation(format!(
            "Cannot derive a file name from {}",
            source.path.display()
        )));
    }

    let record = ProvenanceRecord {
        standard,
        filename: source.name.clone(),
        size_bytes: source.size_bytes,
        created_at: now.trunc_subsecs(0),
        content_hash: sha256_hex(&source.content),
        encryption: options
            .encryption
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string),
        extra_fields: options.extra_fields.clone(),
    };
    info!(
        standard = %record.standard,
        filename = %record.filename,
        size_bytes = record.size_bytes,
        extra_fields = record.extra_fields.len(),
        "Built provenance record"
    );
    Ok(record)
}

fn validate_extra_keys(fields: &ExtraFields) -> Result<(), ProvenanceError> {
    for key in fields.keys() {
        if RESERVED_FIELDS.contains(&key.as_str()) {
            error!(key = %key, "Extra field collides with a reserved field");
            return Err(ProvenanceError::Validation(format!(
                "Extra field {key:?} collides with a reserved field name"
            )));
        }
        validate_key_shape(key)?;
    }
    Ok(())
}

fn validate_key_shape(key: &str) -> Result<(), ProvenanceError> {
    if key.is_empty() {
        return Err(ProvenanceError::Validation(
            "Extra field key must not be empty".to_string(),
        ));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(ProvenanceError::Validation(format!(
            "Extra field key {key:?} must not contain whitespace"
        )));
    }
    Ok(())
}

/// Parses one `KEY=VALUE` argument. Only the first `=` separates; the value may contain more.
pub fn parse_extra_field(raw: &str) -> Result<(String, String), ProvenanceError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        ProvenanceError::Validation(format!("Extra field {raw:?} must look like KEY=VALUE"))
    })?;
    validate_key_shape(key)?;
    Ok((key.to_string(), value.to_string()))
}

/// Parses repeated `KEY=VALUE` arguments, rejecting a key given twice.
pub fn collect_extra_fields<I, S>(raw: I) -> Result<ExtraFields, ProvenanceError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fields = ExtraFields::new();
    for item in raw {
        let (key, value) = parse_extra_field(item.as_ref())?;
        if fields.contains_key(&key) {
            return Err(ProvenanceError::Validation(format!(
                "Extra field {key:?} given more than once"
            )));
        }
        fields.insert(key, value);
    }
    Ok(fields)
}

/// Raw bytes and their record, alive only for the duration of one upload.
#[derive(Debug)]
pub struct UploadBundle {
    pub content: Vec<u8>,
    pub record: ProvenanceRecord,
}

/// The JSON object stored on Swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenancePayload {
    /// Base64 of the original file content.
    pub data: String,
    pub stamp_id: String,
    #[serde(flatten)]
    pub record: ProvenanceRecord,
}

impl UploadBundle {
    pub fn new(source: SourceFile, record: ProvenanceRecord) -> Self {
        UploadBundle {
            content: source.content,
            record,
        }
    }

    /// Serializes the payload for `stamp_id` as UTF-8 JSON.
    pub fn to_payload(&self, stamp_id: &str) -> Result<Vec<u8>, ProvenanceError> {
        let payload = ProvenancePayload {
            data: base64_encode(&self.content),
            stamp_id: stamp_id.to_string(),
            record: self.record.clone(),
        };
        let bytes = serde_json::to_vec(&payload)?;
        debug!(size = bytes.len(), "Serialized provenance payload");
        Ok(bytes)
    }

    /// Size of the payload once a stamp is attached. Batch ids have a fixed length, so a
    /// placeholder gives the exact figure.
    pub fn payload_size(&self) -> Result<usize, ProvenanceError> {
        Ok(self.to_payload(PLACEHOLDER_STAMP_ID)?.len())
    }
}

impl ProvenancePayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProvenanceError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decodes `data` back to the original file bytes.
    pub fn decode_data(&self) -> Result<Vec<u8>, ProvenanceError> {
        STANDARD.decode(&self.data).map_err(|e| {
            ProvenanceError::Validation(format!("Payload data is not valid base64: {e}"))
        })
    }
}
