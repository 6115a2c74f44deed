//! Wrap-and-upload pipeline: read file → build record → obtain stamp → upload.
//!
//! Each step is public so the CLI can report progress between them; [`wrap_and_upload`] runs
//! them in order for callers that only want the result. The pipeline is fail-fast: the first
//! error ends the run, and no step is retried.

use std::path::PathBuf;
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::contract::SwarmGateway;
use crate::error::ProvenanceError;
use crate::file_utils::read_source_file;
use crate::metadata::{build_record, ProvenanceRecord, RecordOptions, UploadBundle};

/// What to upload and how to describe it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub options: RecordOptions,
}

/// A bundle ready for the network, with the figures worth reporting before it is sent.
#[derive(Debug)]
pub struct PreparedUpload {
    pub bundle: UploadBundle,
    pub payload_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub batch_id: String,
    /// False when the batch id came from configuration.
    pub purchased: bool,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub reference: String,
    pub stamp: Stamp,
    pub payload_size: usize,
    pub record: ProvenanceRecord,
}

/// Reads the file and builds its record. Touches only the local file system.
pub fn prepare_upload(
    request: &UploadRequest,
    config: &GatewayConfig,
) -> Result<PreparedUpload, ProvenanceError> {
    let source = read_source_file(&request.file)?;
    let record = build_record(&source, config, &request.options)?;
    let bundle = UploadBundle::new(source, record);
    let payload_size = bundle.payload_size()?;
    info!(
        file = %request.file.display(),
        content_hash = %bundle.record.content_hash,
        payload_size,
        "Prepared upload bundle"
    );
    Ok(PreparedUpload {
        bundle,
        payload_size,
    })
}

/// Uses the configured batch id when there is one, otherwise buys a new stamp.
pub async fn obtain_stamp<G>(gateway: &G, config: &GatewayConfig) -> Result<Stamp, ProvenanceError>
where
    G: SwarmGateway + ?Sized,
{
    if let Some(batch_id) = &config.stamp_id {
        info!(batch_id = %batch_id, "Using configured postage stamp");
        return Ok(Stamp {
            batch_id: batch_id.clone(),
            purchased: false,
        });
    }
    info!(
        depth = config.stamp_depth,
        amount = config.stamp_amount,
        "Purchasing postage stamp"
    );
    match gateway
        .purchase_stamp(config.stamp_depth, config.stamp_amount)
        .await
    {
        Ok(batch_id) => {
            info!(batch_id = %batch_id, "Postage stamp purchased");
            Ok(Stamp {
                batch_id,
                purchased: true,
            })
        }
        Err(e) => {
            error!(error = %e, "Stamp purchase failed");
            Err(e)
        }
    }
}

/// Serializes the bundle with `stamp` and sends it in a single request.
pub async fn upload_prepared<G>(
    gateway: &G,
    prepared: PreparedUpload,
    stamp: Stamp,
) -> Result<UploadReceipt, ProvenanceError>
where
    G: SwarmGateway + ?Sized,
{
    let payload = prepared.bundle.to_payload(&stamp.batch_id)?;
    match gateway.upload(payload, &stamp.batch_id).await {
        Ok(reference) => {
            info!(reference = %reference, "Upload complete");
            Ok(UploadReceipt {
                reference,
                stamp,
                payload_size: prepared.payload_size,
                record: prepared.bundle.record,
            })
        }
        Err(e) => {
            error!(error = %e, batch_id = %stamp.batch_id, "Upload failed");
            Err(e)
        }
    }
}

/// Entrypoint: runs every step in order against `gateway`.
pub async fn wrap_and_upload<G>(
    gateway: &G,
    config: &GatewayConfig,
    request: &UploadRequest,
) -> Result<UploadReceipt, ProvenanceError>
where
    G: SwarmGateway + ?Sized,
{
    let prepared = prepare_upload(request, config)?;
    let stamp = obtain_stamp(gateway, config).await?;
    upload_prepared(gateway, prepared, stamp).await
}
