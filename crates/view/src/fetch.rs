use buildview_api_client::{ApiClient, GetInvocationRequest};
use buildview_core::InvocationRecord;
use serde::Serialize;
use std::fmt;
use std::future::Future;

/// Opaque name of one build invocation. Fixed for the lifetime of a view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InvocationId(String);

impl InvocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvocationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for InvocationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Any failure to obtain invocation records. The controller does not
/// distinguish causes: every variant ends in the not-found page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invocation request failed: {0:#}")]
    Request(#[from] anyhow::Error),

    #[error("{0}")]
    Other(String),
}

/// Where invocation records come from.
pub trait InvocationSource: Send + Sync {
    fn fetch_invocation(
        &self,
        id: &InvocationId,
    ) -> impl Future<Output = Result<Vec<InvocationRecord>, FetchError>> + Send;
}

impl InvocationSource for ApiClient {
    async fn fetch_invocation(
        &self,
        id: &InvocationId,
    ) -> Result<Vec<InvocationRecord>, FetchError> {
        let resp = self
            .get_invocation(&GetInvocationRequest::for_invocation(id.as_str()))
            .await?;
        Ok(resp.invocation)
    }
}
