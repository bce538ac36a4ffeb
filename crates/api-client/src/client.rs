use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{GetInvocationRequest, GetInvocationResponse};

/// Typed HTTP client for the invocation RPC service.
///
/// Every call is a JSON `POST` to `{base_url}/rpc/BuildBuddyService/{method}`.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, method: &str) -> String {
        format!("{}/rpc/BuildBuddyService/{method}", self.base_url)
    }

    async fn call<Req, Resp>(&self, method: &str, req: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = self.url(method);
        debug!("POST {url}");
        let resp = self.client.post(&url).json(req).send().await?;
        parse_response(resp).await
    }

    // ── Invocations ───────────────────────────────────────────────────────

    pub async fn get_invocation(&self, req: &GetInvocationRequest) -> Result<GetInvocationResponse> {
        self.call("GetInvocation", req).await
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error containing the status and body text.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("{status}: {body}");
    }
    Ok(resp.json().await?)
}
