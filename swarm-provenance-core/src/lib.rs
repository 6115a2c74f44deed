#![doc = "swarm-provenance-core: core logic library for swarm-provenance."]

//! This crate holds everything the uploader does apart from talking HTTP and parsing flags:
//! resolving gateway configuration, reading the source file, building the provenance record,
//! and the [`contract::SwarmGateway`] seam the CLI's Bee client implements.
//!
//! # Usage
//! The CLI crate resolves a [`config::GatewayConfig`], then hands a concrete gateway and an
//! [`pipeline::UploadRequest`] to [`pipeline::wrap_and_upload`].

pub mod config;
pub mod contract;
pub mod error;
pub mod file_utils;
pub mod metadata;
pub mod pipeline;

pub use error::{ErrorKind, ProvenanceError};
