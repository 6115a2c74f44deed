//! # contract: the seam between the uploader and a Swarm gateway
//!
//! [`SwarmGateway`] is implemented by the CLI's HTTP client for a Bee node and, under the
//! `test-export-mocks` feature, by the generated `MockSwarmGateway` for tests.
//!
//! Implementors make exactly one attempt per call; failures come back as
//! [`ProvenanceError::Network`] (request never completed) or [`ProvenanceError::Upload`]
//! (gateway answered with a non-success status).

use async_trait::async_trait;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::error::ProvenanceError;

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SwarmGateway: Send + Sync {
    /// Buy a postage batch of the given depth and amount, returning its batch id.
    async fn purchase_stamp(&self, depth: u8, amount: u64) -> Result<String, ProvenanceError>;

    /// Store `payload` using `stamp_id`, returning the content address the gateway assigns.
    async fn upload(&self, payload: Vec<u8>, stamp_id: &str) -> Result<String, ProvenanceError>;
}
