//! Gateway configuration: the one place environment values are read and validated.
//!
//! [`GatewayConfig::resolve`] takes a key lookup rather than touching `std::env` directly, so the
//! CLI resolves the process environment exactly once and everything downstream receives an
//! immutable [`GatewayConfig`].

use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::ProvenanceError;

pub const DEFAULT_STANDARD: &str = "PROV-O";
pub const DEFAULT_POSTAGE_DEPTH: u8 = 17;
pub const DEFAULT_POSTAGE_AMOUNT: u64 = 1_000_000_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_GATEWAY_URL: &str = "BEE_GATEWAY_URL";
pub const ENV_DEFAULT_STANDARD: &str = "DEFAULT_PROVENANCE_STANDARD";
pub const ENV_POSTAGE_DEPTH: &str = "DEFAULT_POSTAGE_DEPTH";
pub const ENV_POSTAGE_AMOUNT: &str = "DEFAULT_POSTAGE_AMOUNT";
pub const ENV_POSTAGE_BATCH_ID: &str = "BEE_POSTAGE_BATCH_ID";
pub const ENV_TIMEOUT_SECS: &str = "BEE_REQUEST_TIMEOUT_SECS";
pub const ENV_API_TOKEN: &str = "BEE_API_TOKEN";

/// Resolved connection settings for the Bee gateway. Built once per invocation, never mutated.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway, always with a trailing `/` so endpoints join beneath it.
    pub gateway_url: Url,
    pub default_standard: String,
    pub stamp_depth: u8,
    pub stamp_amount: u64,
    /// Pre-purchased postage batch. When set, no stamp is bought.
    pub stamp_id: Option<String>,
    pub timeout: Duration,
    pub api_token: Option<String>,
}

/// Values supplied on the command line. Each one wins over its environment counterpart.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub gateway_url: Option<String>,
    pub stamp_depth: Option<u8>,
    pub stamp_amount: Option<u64>,
    pub stamp_id: Option<String>,
}

impl GatewayConfig {
    /// Resolve from the process environment.
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self, ProvenanceError> {
        Self::resolve(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolve from an arbitrary key lookup. Blank values count as unset.
    pub fn resolve<F>(lookup: F, overrides: &ConfigOverrides) -> Result<Self, ProvenanceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_url = overrides
            .gateway_url
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| get(ENV_GATEWAY_URL))
            .ok_or_else(|| {
                error!(key = ENV_GATEWAY_URL, "Gateway URL missing from configuration");
                ProvenanceError::Configuration(format!(
                    "{ENV_GATEWAY_URL} is not set; export it or pass --gateway-url"
                ))
            })?;
        let gateway_url = parse_gateway_url(&raw_url)?;

        let default_standard =
            get(ENV_DEFAULT_STANDARD).unwrap_or_else(|| DEFAULT_STANDARD.to_string());

        let stamp_depth = overrides.stamp_depth.unwrap_or_else(|| {
            parse_or_default(get(ENV_POSTAGE_DEPTH), ENV_POSTAGE_DEPTH, DEFAULT_POSTAGE_DEPTH)
        });
        let stamp_amount = overrides.stamp_amount.unwrap_or_else(|| {
            parse_or_default(
                get(ENV_POSTAGE_AMOUNT),
                ENV_POSTAGE_AMOUNT,
                DEFAULT_POSTAGE_AMOUNT,
            )
        });

        let stamp_id = match overrides
            .stamp_id
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| get(ENV_POSTAGE_BATCH_ID))
        {
            Some(id) => Some(validate_batch_id(id.trim())?),
            None => None,
        };

        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ProvenanceError::Configuration(format!(
                        "{ENV_TIMEOUT_SECS} must be a positive number of seconds, got {raw:?}"
                    )))
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let config = GatewayConfig {
            gateway_url,
            default_standard,
            stamp_depth,
            stamp_amount,
            stamp_id,
            timeout,
            api_token: get(ENV_API_TOKEN),
        };
        config.trace_loaded();
        Ok(config)
    }

    /// Absolute URL of a gateway endpoint such as `bzz` or `stamps/{amount}/{depth}`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ProvenanceError> {
        self.gateway_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProvenanceError::Configuration(format!("Invalid endpoint {path:?}: {e}")))
    }

    pub fn trace_loaded(&self) {
        info!(
            gateway_url = %self.gateway_url,
            default_standard = %self.default_standard,
            stamp_configured = self.stamp_id.is_some(),
            "Loaded gateway configuration"
        );
        debug!(
            stamp_depth = self.stamp_depth,
            stamp_amount = self.stamp_amount,
            timeout_secs = self.timeout.as_secs(),
            api_token_set = self.api_token.is_some(),
            "Gateway configuration details"
        );
    }
}

/// Parses a gateway base URL, accepting only absolute http(s) URLs with a host.
pub fn parse_gateway_url(raw: &str) -> Result<Url, ProvenanceError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| {
        ProvenanceError::Configuration(format!("Gateway URL {raw:?} is not a valid URL: {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ProvenanceError::Configuration(format!(
            "Gateway URL {raw:?} must be an absolute http(s) URL"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Postage batch ids are 32 bytes, hex encoded.
pub fn validate_batch_id(id: &str) -> Result<String, ProvenanceError> {
    let hex = id.strip_prefix("0x").unwrap_or(id);
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_lowercase())
    } else {
        Err(ProvenanceError::Configuration(format!(
            "Postage batch id must be 64 hex characters, got {id:?}"
        )))
    }
}

fn parse_or_default<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(key, value = %value, %default, "Unparsable value, using default");
            default
        }),
        None => default,
    }
}
