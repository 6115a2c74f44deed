#![doc = "Bee gateway client: implements the core `SwarmGateway` contract over the Bee HTTP API."]
//
//! # Bee Gateway Client
//!
//! [`BeeClient`] is the production [`SwarmGateway`]: it buys postage stamps and uploads
//! provenance payloads through a Bee node's HTTP API.
//!
//! - Stamp purchase: `POST /stamps/{amount}/{depth}`, answered with `{"batchID": "..."}`.
//! - Upload: `POST /bzz` with the `Swarm-Postage-Batch-Id` header and a JSON body, answered with
//!   `{"reference": "..."}`.
//!
//! Endpoints are joined beneath the configured gateway URL, so a gateway mounted under a path
//! prefix works too. Each call is a single attempt bounded by the configured timeout.
//!
//! ## Client Usage
//! - Construct with [`BeeClient::new`] from a resolved [`GatewayConfig`]. The timeout and the
//!   optional bearer token (`BEE_API_TOKEN`) come from that config.
//! - Drive it through the core pipeline, or call the [`SwarmGateway`] methods directly.
//!
//! ## Errors
//! - Transport failures (refused connection, timeout, unreadable body) become
//!   `ProvenanceError::Network`.
//! - Non-2xx statuses become `ProvenanceError::Upload`, carrying the status and body.
//! - A 2xx response without a usable batch id or reference becomes
//!   `ProvenanceError::UnexpectedResponse`.
//!
//! ## Adding Another Gateway
//! Implement [`SwarmGateway`] for the new client, for example a hosted gateway with a different
//! upload path. Then construct it in `cli::run` in place of [`BeeClient`]. The pipeline and the
//! CLI output need no changes.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde::Deserialize;
use swarm_provenance_core::config::GatewayConfig;
use swarm_provenance_core::contract::SwarmGateway;
use swarm_provenance_core::ProvenanceError;

pub const POSTAGE_BATCH_HEADER: &str = "Swarm-Postage-Batch-Id";
const PAYLOAD_CONTENT_TYPE: &str = "application/json";

pub struct BeeClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Debug, Deserialize)]
struct StampResponse {
    #[serde(rename = "batchID")]
    batch_id: Option<String>,
}

impl BeeClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, ProvenanceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                ProvenanceError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        tracing::info!(
            gateway_url = %config.gateway_url,
            timeout_secs = config.timeout.as_secs(),
            "Initialized BeeClient"
        );
        Ok(BeeClient {
            http,
            config: config.clone(),
        })
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, ProvenanceError> {
        let url = self.config.endpoint(path)?;
        let builder = self.http.post(url);
        Ok(match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Sends the request once and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder, action: &str) -> Result<String, ProvenanceError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, action, "Request to gateway failed");
            ProvenanceError::Network(format!("{action} failed: {e}"))
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = ?e, action, %status, "Failed to read gateway response");
            ProvenanceError::Network(format!("{action} failed reading response: {e}"))
        })?;
        if !status.is_success() {
            tracing::error!(action, status = status.as_u16(), body = %body, "Gateway rejected request");
            return Err(ProvenanceError::Upload {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(action, status = status.as_u16(), "Gateway accepted request");
        Ok(body)
    }
}

#[async_trait]
impl SwarmGateway for BeeClient {
    async fn purchase_stamp(&self, depth: u8, amount: u64) -> Result<String, ProvenanceError> {
        tracing::info!(depth, amount, "Requesting postage stamp from gateway");
        let request = self
            .post(&format!("stamps/{amount}/{depth}"))?
            .header(CONTENT_TYPE, PAYLOAD_CONTENT_TYPE);
        let body = self.send(request, "Stamp purchase").await?;

        let parsed: StampResponse = serde_json::from_str(&body).map_err(|e| {
            ProvenanceError::UnexpectedResponse(format!(
                "Could not parse stamp purchase response: {e}"
            ))
        })?;
        match parsed.batch_id.filter(|id| !id.is_empty()) {
            Some(batch_id) => Ok(batch_id),
            None => Err(ProvenanceError::UnexpectedResponse(
                "Stamp purchase response missing 'batchID'".to_string(),
            )),
        }
    }

    async fn upload(&self, payload: Vec<u8>, stamp_id: &str) -> Result<String, ProvenanceError> {
        tracing::info!(size = payload.len(), batch_id = stamp_id, "Uploading payload to gateway");
        let request = self
            .post("bzz")?
            .header(POSTAGE_BATCH_HEADER, stamp_id)
            .header(CONTENT_TYPE, PAYLOAD_CONTENT_TYPE)
            .body(payload);
        let body = self.send(request, "Swarm upload").await?;
        extract_reference(&body)
    }
}

/// Pulls the content address out of an upload response: JSON `{"reference": ...}`, or a bare
/// address in a plain-text body. A plain-text body must be a single token; markup such as a
/// proxy's HTML page is rejected.
fn extract_reference(body: &str) -> Result<String, ProvenanceError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ProvenanceError::UnexpectedResponse(
            "Upload response body was empty".to_string(),
        ));
    }
    let reference = if trimmed.starts_with('{') || trimmed.starts_with('"') {
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Object(map)) => map
                .get("reference")
                .and_then(|r| r.as_str())
                .map(str::to_string),
            Ok(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    } else if trimmed.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
        None
    } else {
        Some(trimmed.to_string())
    };
    reference.filter(|r| !r.is_empty()).ok_or_else(|| {
        ProvenanceError::UnexpectedResponse("Upload response missing 'reference'".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_provenance_core::config::{ConfigOverrides, ENV_API_TOKEN, ENV_GATEWAY_URL};

    const BATCH: &str = "a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3";

    fn client_for(url: &str, token: Option<&str>) -> BeeClient {
        let url = url.to_string();
        let token = token.map(str::to_string);
        let config = GatewayConfig::resolve(
            |key| match key {
                ENV_GATEWAY_URL => Some(url.clone()),
                ENV_API_TOKEN => token.clone(),
                _ => None,
            },
            &ConfigOverrides::default(),
        )
        .expect("config");
        BeeClient::new(&config).expect("client")
    }

    #[tokio::test]
    async fn upload_sends_batch_header_and_returns_reference() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bzz")
            .match_header("swarm-postage-batch-id", BATCH)
            .match_header("content-type", "application/json")
            .match_body(r#"{"hello":"swarm"}"#)
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reference":"0xabc123"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let reference = client
            .upload(br#"{"hello":"swarm"}"#.to_vec(), BATCH)
            .await
            .expect("upload should succeed");

        assert_eq!(reference, "0xabc123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bzz")
            .with_status(500)
            .with_body("internal server error")
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let err = client.upload(b"{}".to_vec(), BATCH).await.unwrap_err();
        match err {
            ProvenanceError::Upload { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal server error");
            }
            other => panic!("expected upload error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stamp_purchase_puts_amount_before_depth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/stamps/1000000000/17")
            .with_status(201)
            .with_body(format!(r#"{{"batchID":"{BATCH}","txHash":"0x01"}}"#))
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let batch_id = client.purchase_stamp(17, 1_000_000_000).await.unwrap();
        assert_eq!(batch_id, BATCH);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn stamp_response_without_batch_id_is_unexpected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/stamps/10/17")
            .with_status(201)
            .with_body(r#"{"txHash":"0x01"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let err = client.purchase_stamp(17, 10).await.unwrap_err();
        assert!(matches!(err, ProvenanceError::UnexpectedResponse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn api_token_is_sent_as_bearer_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bzz")
            .match_header("authorization", "Bearer secret-token")
            .with_status(201)
            .with_body(r#"{"reference":"0xabc123"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("secret-token"));
        client.upload(b"{}".to_vec(), BATCH).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_network_error() {
        let client = client_for("http://127.0.0.1:1", None);
        let err = client.upload(b"{}".to_vec(), BATCH).await.unwrap_err();
        assert!(matches!(err, ProvenanceError::Network(_)), "got {err:?}");
    }

    #[test]
    fn reference_extraction_accepts_json_and_plain_text() {
        assert_eq!(
            extract_reference(r#"{"reference":"0xabc123"}"#).unwrap(),
            "0xabc123"
        );
        assert_eq!(extract_reference("0xabc123\n").unwrap(), "0xabc123");
        assert_eq!(extract_reference(r#""0xabc123""#).unwrap(), "0xabc123");
        assert!(extract_reference(r#"{"other":"x"}"#).is_err());
        assert!(extract_reference("   ").is_err());
    }

    #[test]
    fn all_digit_plain_text_reference_is_kept_verbatim() {
        let digits = "1".repeat(64);
        assert_eq!(extract_reference(&digits).unwrap(), digits);
    }

    #[test]
    fn markup_or_multi_word_bodies_are_not_references() {
        for body in ["<html>ok</html>", "upload ok", "{not json"] {
            let err = extract_reference(body).unwrap_err();
            assert!(
                matches!(err, ProvenanceError::UnexpectedResponse(_)),
                "{body:?} should be rejected, got {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn html_success_page_is_an_unexpected_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bzz")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let err = client.upload(b"{}".to_vec(), BATCH).await.unwrap_err();
        assert!(matches!(err, ProvenanceError::UnexpectedResponse(_)), "got {err:?}");
    }
}
