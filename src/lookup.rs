//! The remote geolocation service, reduced to the one question we ask it:
//! which autonomous system does this address belong to?

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The service reported itself temporarily unavailable (HTTP 504).
    #[error("service unavailable (HTTP {0})")]
    Unavailable(StatusCode),

    /// Anything but 200 or 504, including other 2xx codes.
    #[error("lookup rejected (HTTP {0})")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response body is not JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty response payload")]
    Empty,

    #[error("endpoint {0} cannot take a path segment")]
    Endpoint(Url),
}

impl LookupError {
    /// Transient failures are worth another attempt after the backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LookupError::Unavailable(_) | LookupError::Transport(_) | LookupError::Decode(_)
        )
    }
}

/// `Ok(None)` means the service answered but had no ASN for the address.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> Result<Option<u32>, LookupError>;
}

pub struct HttpLookup {
    client: Client,
    endpoint: Url,
}

impl HttpLookup {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL '{}'", endpoint))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("Endpoint URL '{}' cannot be used as a base", endpoint);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, endpoint })
    }

    fn url_for(&self, ip: &str) -> Result<Url, LookupError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::Endpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .push(ip);
        Ok(url)
    }
}

#[async_trait]
impl Lookup for HttpLookup {
    async fn lookup(&self, ip: &str) -> Result<Option<u32>, LookupError> {
        let url = self.url_for(ip)?;
        debug!(action = "request", component = "lookup", url = %url, "GET");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::GATEWAY_TIMEOUT {
            return Err(LookupError::Unavailable(status));
        }
        if status != StatusCode::OK {
            return Err(LookupError::Status(status));
        }

        let body = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&body)?;
        if is_empty_payload(&payload) {
            return Err(LookupError::Empty);
        }
        Ok(extract_asn(&payload))
    }
}

/// Only a non-empty object can describe an address; `null`, `{}`, arrays and scalars carry nothing.
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Object(map) => map.is_empty(),
        _ => true,
    }
}

/// Reads `as.number`. Numbers and `"AS13335"`-style strings are accepted; zero is treated as absent.
pub fn extract_asn(payload: &Value) -> Option<u32> {
    let number = payload.get("as")?.get("number")?;
    let asn = match number {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => {
            let digits = s.trim();
            let digits = digits
                .strip_prefix("AS")
                .or_else(|| digits.strip_prefix("as"))
                .unwrap_or(digits);
            digits.parse::<u64>().ok()?
        }
        _ => return None,
    };
    u32::try_from(asn).ok().filter(|&asn| asn != 0)
}
