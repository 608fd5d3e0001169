use crate::agent::AgentKind;
use crate::{ConductorError, ConductorResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// An inbound task request. Created by the caller, consumed once by the
/// engine, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// The user making the request.
    pub user_id: String,
    /// The free-text query or command.
    pub query: String,
    /// Optional explicit capability preference.
    pub preferred_kind: Option<AgentKind>,
    /// Additional per-request context.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// UTC timestamp of request creation.
    pub created_at: DateTime<Utc>,
}

impl TaskRequest {
    /// Create a request, enforcing the non-empty query and user id invariants.
    pub fn new(user_id: impl Into<String>, query: impl Into<String>) -> ConductorResult<Self> {
        let user_id = user_id.into();
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ConductorError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        if user_id.trim().is_empty() {
            return Err(ConductorError::Validation(
                "user id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            query,
            preferred_kind: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        })
    }

    /// Prefer agents of the given capability kind.
    pub fn with_preferred_kind(mut self, kind: AgentKind) -> Self {
        self.preferred_kind = Some(kind);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Terminal status of a processed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The agent produced a result and guardrails passed.
    Success,
    /// Resolution, guardrails, or the retry loop failed terminally.
    Failed,
    /// The final failure was a deadline expiry.
    Timeout,
    /// The access policy denied the request before any agent was invoked.
    Rejected,
}

/// States a task moves through inside the engine.
///
/// `Completed`, `Rejected`, and `Failed` are terminal; no task re-enters the
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Accepted by the engine, not yet processed.
    Received,
    /// Running the pre-invocation guardrail stage.
    GuardrailPre,
    /// Resolving the target agent from the registry.
    AgentResolution,
    /// Inside the invocation retry loop.
    Invoking,
    /// Running the post-invocation guardrail stage.
    GuardrailPost,
    /// Finished successfully.
    Completed,
    /// Denied by the access policy.
    Rejected,
    /// Finished with a terminal error.
    Failed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Received => "received",
            TaskState::GuardrailPre => "guardrail_pre",
            TaskState::AgentResolution => "agent_resolution",
            TaskState::Invoking => "invoking",
            TaskState::GuardrailPost => "guardrail_post",
            TaskState::Completed => "completed",
            TaskState::Rejected => "rejected",
            TaskState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// The kind of a guardrail detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// An email address was masked.
    PiiEmail,
    /// A phone number was masked.
    PiiPhone,
    /// A government id number was masked.
    PiiSsn,
    /// A payment card number was masked.
    PiiCreditCard,
    /// The request failed structural validation.
    ValidationError,
    /// The access policy denied the request.
    AccessDenied,
}

/// A single guardrail detection attached to a task's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// What the guardrail detected.
    pub kind: FindingKind,
    /// Byte range of the original match, when the finding masked text.
    pub span: Option<(usize, usize)>,
    /// The redaction token inserted, empty for policy findings.
    pub replacement: String,
}

impl Finding {
    /// A finding produced by masking `span` with `replacement`.
    pub fn masked(kind: FindingKind, span: (usize, usize), replacement: impl Into<String>) -> Self {
        Self {
            kind,
            span: Some(span),
            replacement: replacement.into(),
        }
    }

    /// A policy finding with no associated text span.
    pub fn policy(kind: FindingKind) -> Self {
        Self {
            kind,
            span: None,
            replacement: String::new(),
        }
    }
}

/// The engine's outbound response for a single task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    /// The originating request id.
    pub request_id: Uuid,
    /// Terminal status.
    pub status: TaskStatus,
    /// Result payload, present iff `status == Success`.
    pub result: Option<serde_json::Value>,
    /// Error detail, present iff `status != Success`.
    pub error: Option<String>,
    /// The agent that handled the task, when one was resolved.
    pub agent_id: Option<Uuid>,
    /// Name of the handling agent.
    pub agent_name: Option<String>,
    /// Wall-clock time the task spent in the engine.
    pub elapsed: Duration,
    /// Guardrail actions applied during processing.
    pub findings: Vec<Finding>,
    /// UTC timestamp of response creation.
    pub timestamp: DateTime<Utc>,
}

impl TaskResponse {
    /// Build a success response.
    pub fn success(
        request_id: Uuid,
        agent_id: Uuid,
        agent_name: impl Into<String>,
        result: serde_json::Value,
        elapsed: Duration,
        findings: Vec<Finding>,
    ) -> Self {
        Self {
            request_id,
            status: TaskStatus::Success,
            result: Some(result),
            error: None,
            agent_id: Some(agent_id),
            agent_name: Some(agent_name.into()),
            elapsed,
            findings,
            timestamp: Utc::now(),
        }
    }

    /// Build a non-success response with the given terminal status.
    pub fn failure(
        request_id: Uuid,
        status: TaskStatus,
        error: impl Into<String>,
        elapsed: Duration,
        findings: Vec<Finding>,
    ) -> Self {
        Self {
            request_id,
            status,
            result: None,
            error: Some(error.into()),
            agent_id: None,
            agent_name: None,
            elapsed,
            findings,
            timestamp: Utc::now(),
        }
    }

    /// Attribute the response to the agent that handled it.
    pub fn with_agent(mut self, agent_id: Uuid, agent_name: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id);
        self.agent_name = Some(agent_name.into());
        self
    }
}
