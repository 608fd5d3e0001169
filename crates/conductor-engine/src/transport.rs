use async_trait::async_trait;
use conductor_core::{AgentDescriptor, ConductorError, ConductorResult, TaskRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The payload handed to a transport for one invocation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationPayload {
    /// The originating request id.
    pub request_id: Uuid,
    /// The requesting user.
    pub user_id: String,
    /// The sanitized query text.
    pub query: String,
    /// Per-request context forwarded to the agent.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl InvocationPayload {
    /// Build a payload from a (sanitized) task request.
    pub fn from_request(request: &TaskRequest) -> Self {
        Self {
            request_id: request.id,
            user_id: request.user_id.clone(),
            query: request.query.clone(),
            metadata: request.metadata.clone(),
        }
    }
}

/// The abstract remote call to an agent endpoint.
///
/// Concrete implementations (cloud function call, HTTP call, in-process stub)
/// are injected into the engine; the core only requires this signature and
/// its error semantics. Implementations should report remote-side failures as
/// [`ConductorError::AgentInvocation`]; the invoker normalizes anything else.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Invoke the agent behind `endpoint` with the given payload.
    async fn invoke(
        &self,
        endpoint: &str,
        payload: &InvocationPayload,
    ) -> ConductorResult<serde_json::Value>;
}

/// Performs transport invocations under each agent's configured deadline.
pub struct AgentInvoker {
    transport: Arc<dyn AgentTransport>,
}

impl AgentInvoker {
    /// Wrap a transport.
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<dyn AgentTransport> {
        &self.transport
    }

    /// One invocation attempt with a hard deadline of `agent.timeout`.
    ///
    /// Deadline expiry yields [`ConductorError::AgentTimeout`]; remote-side
    /// errors are surfaced as [`ConductorError::AgentInvocation`]. The call
    /// has no side effects on the registry.
    pub async fn invoke(
        &self,
        agent: &AgentDescriptor,
        payload: &InvocationPayload,
    ) -> ConductorResult<serde_json::Value> {
        match tokio::time::timeout(agent.timeout, self.transport.invoke(&agent.endpoint, payload))
            .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(match err {
                e @ (ConductorError::AgentInvocation(_) | ConductorError::AgentTimeout(_)) => e,
                other => ConductorError::AgentInvocation(other.to_string()),
            }),
            Err(_elapsed) => Err(ConductorError::AgentTimeout(agent.timeout)),
        }
    }
}
