use buildview_core::InvocationRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationQuery {
    pub invocation_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetInvocationRequest {
    pub query: InvocationQuery,
}

impl GetInvocationRequest {
    pub fn for_invocation(invocation_id: &str) -> Self {
        Self {
            query: InvocationQuery {
                invocation_id: invocation_id.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetInvocationResponse {
    /// Matching records; the service omits the field when nothing matched.
    #[serde(default)]
    pub invocation: Vec<InvocationRecord>,
}
