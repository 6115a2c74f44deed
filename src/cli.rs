//! # swarm-provenance CLI Interface
//!
//! Command parsing and orchestration for the `swarm-provenance` binary. The business logic
//! (configuration rules, file reading, provenance records, the gateway contract) lives in
//! [`swarm_provenance_core`]; this module only wires those pieces together in order and reports
//! progress on stdout.
//!
//! The order is fixed: configuration is resolved before the file is touched, and the file is
//! read and validated before any request reaches the gateway.
//!
//! Errors leave [`run`] as `anyhow::Error` with the failing step as context; [`exit_code`] maps
//! the underlying [`ProvenanceError`] kind to the process exit status.
//!
//! ## Features
//! - [`Cli`] defines the global flags (`--env-file`, `-v`) and the `upload` subcommand.
//! - [`run`] is the async entrypoint used by `main()` and by integration tests.
//! - [`upload_with`] runs the steps against any [`SwarmGateway`], so a mock or alternative
//!   gateway can be driven through the same output and error handling.
//!
//! ## How To Use
//! - From a shell: `swarm-provenance upload --file data.csv --std PROV-O -F lab=north`,
//!   with `BEE_GATEWAY_URL` set or given via `--gateway-url`. See `--help` for every flag.
//! - From code: build a [`Cli`] (or parse one) and await [`run`].
//!
//! ## Extending
//! - New subcommand: add a variant to [`Commands`] with its own `Args` struct and a match arm in
//!   [`run`]. Keep validation and payload logic in the core crate.
//! - New exit code: add an [`ErrorKind`] in the core crate and map it in [`exit_code`].

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use swarm_provenance_core::config::{ConfigOverrides, GatewayConfig};
use swarm_provenance_core::contract::SwarmGateway;
use swarm_provenance_core::metadata::{collect_extra_fields, RecordOptions};
use swarm_provenance_core::pipeline::{
    obtain_stamp, prepare_upload, upload_prepared, UploadReceipt, UploadRequest,
};
use swarm_provenance_core::{ErrorKind, ProvenanceError};

use crate::load_config::load_config;
use crate::upload::BeeClient;

pub const EXIT_CONFIGURATION: u8 = 3;
pub const EXIT_FILE: u8 = 4;
pub const EXIT_VALIDATION: u8 = 5;
pub const EXIT_NETWORK: u8 = 6;
pub const EXIT_UPLOAD: u8 = 7;

/// Swarm Provenance CLI: wraps data files with provenance metadata and uploads them to Swarm.
#[derive(Parser)]
#[clap(name = "swarm-provenance", version)]
pub struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[clap(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[clap(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hash, Base64-encode, wrap and upload a provenance data file to Swarm
    Upload(UploadArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Path to the provenance data file to wrap and upload
    #[clap(short, long, value_name = "PATH")]
    pub file: PathBuf,

    /// Identifier for the provenance standard used [default: $DEFAULT_PROVENANCE_STANDARD or PROV-O]
    #[clap(long = "std", visible_alias = "standard", value_name = "ID")]
    pub provenance_standard: Option<String>,

    /// Details about encryption applied to the original data
    #[clap(long = "enc", visible_alias = "encryption", value_name = "NOTE")]
    pub encryption: Option<String>,

    /// Extra metadata field; repeat for more
    #[clap(short = 'F', long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Bee gateway URL [default: $BEE_GATEWAY_URL]
    #[clap(long, value_name = "URL")]
    pub gateway_url: Option<String>,

    /// Postage stamp depth [default: $DEFAULT_POSTAGE_DEPTH or 17]
    #[clap(long, value_name = "DEPTH")]
    pub stamp_depth: Option<u8>,

    /// Postage stamp amount [default: $DEFAULT_POSTAGE_AMOUNT or 1000000000]
    #[clap(long, value_name = "AMOUNT")]
    pub stamp_amount: Option<u64>,

    /// Use an existing postage batch instead of buying one [default: $BEE_POSTAGE_BATCH_ID]
    #[clap(long, value_name = "BATCH_ID")]
    pub stamp_id: Option<String>,
}

impl UploadArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            gateway_url: self.gateway_url.clone(),
            stamp_depth: self.stamp_depth,
            stamp_amount: self.stamp_amount,
            stamp_id: self.stamp_id.clone(),
        }
    }

    pub fn record_options(&self) -> Result<RecordOptions, ProvenanceError> {
        Ok(RecordOptions {
            standard: self.provenance_standard.clone(),
            encryption: self.encryption.clone(),
            extra_fields: collect_extra_fields(&self.fields)?,
        })
    }
}

/// CLI entrypoint for main() and integration tests.
pub async fn run(cli: Cli) -> Result<UploadReceipt> {
    match cli.command {
        Commands::Upload(args) => {
            let config = load_config(cli.env_file.as_deref(), &args.overrides())?;
            tracing::info!(command = "upload", file = %args.file.display(), "Starting upload");
            let gateway = BeeClient::new(&config)?;
            upload_with(&gateway, &config, &args).await
        }
    }
}

/// Runs the upload steps against any gateway, printing progress as the original tool does.
pub async fn upload_with<G>(
    gateway: &G,
    config: &GatewayConfig,
    args: &UploadArgs,
) -> Result<UploadReceipt>
where
    G: SwarmGateway + ?Sized,
{
    println!("--> Processing file: {}", args.file.display());
    let request = UploadRequest {
        file: args.file.clone(),
        options: args.record_options()?,
    };

    let prepared = prepare_upload(&request, config).context("Failed preparing upload")?;
    println!("    SHA256 Hash: {}", prepared.bundle.record.content_hash);
    println!(
        "    Estimated Metadata Payload Size: {} bytes",
        prepared.payload_size
    );

    if config.stamp_id.is_none() {
        println!("--> Purchasing postage stamp from {}...", config.gateway_url);
    }
    let stamp = obtain_stamp(gateway, config)
        .await
        .context("Failed purchasing stamp")?;
    println!("    Stamp ID: {}", stamp.batch_id);

    println!(
        "--> Uploading metadata to Swarm using stamp {}...",
        stamp.batch_id
    );
    let receipt = upload_prepared(gateway, prepared, stamp)
        .await
        .context("Failed uploading data")?;

    println!("\nSUCCESS! Upload complete.");
    println!("\nSwarm Reference Hash:");
    println!("{}", receipt.reference);
    Ok(receipt)
}

/// Exit status for a failed run: one code per error kind, 1 for anything unclassified.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let kind = err
        .chain()
        .find_map(|e| e.downcast_ref::<ProvenanceError>())
        .map(ProvenanceError::kind);
    match kind {
        Some(ErrorKind::Configuration) => EXIT_CONFIGURATION,
        Some(ErrorKind::File) => EXIT_FILE,
        Some(ErrorKind::Validation) => EXIT_VALIDATION,
        Some(ErrorKind::Network) => EXIT_NETWORK,
        Some(ErrorKind::Upload) => EXIT_UPLOAD,
        Some(ErrorKind::Internal) | None => 1,
    }
}
