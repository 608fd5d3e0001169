//! Core types and error definitions for the Conductor orchestration layer.
//!
//! This crate provides the foundational types shared across all Conductor
//! crates: the unified error enum, the task request/response model, agent
//! descriptors, and guardrail finding types.
//!
//! # Main types
//!
//! - [`ConductorError`] — Unified error enum for all Conductor subsystems.
//! - [`ConductorResult`] — Convenience alias for `Result<T, ConductorError>`.
//! - [`AgentKind`] — Closed set of capability kinds an agent can serve.
//! - [`AgentDescriptor`] — Immutable configuration of a registered agent.
//! - [`TaskRequest`] / [`TaskResponse`] — The engine's inbound/outbound model.
//! - [`Finding`] — A single guardrail detection attached to a task's audit trail.

/// Agent descriptors and capability kinds.
pub mod agent;
/// Task request/response model and guardrail findings.
pub mod task;

pub use agent::{AgentDescriptor, AgentKind};
pub use task::{Finding, FindingKind, TaskRequest, TaskResponse, TaskState, TaskStatus};

use std::time::Duration;
use uuid::Uuid;

// --- Error types ---

/// Top-level error type for the Conductor orchestration layer.
///
/// Each variant corresponds to a failure class the engine converts into a
/// terminal [`TaskResponse`] status; only registry management errors
/// ([`ConductorError::Validation`], [`ConductorError::DuplicateAgent`])
/// surface to callers directly.
#[derive(Debug, thiserror::Error)]
pub enum ConductorError {
    /// A malformed request or agent descriptor. Local, never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A guardrail pipeline malfunction (bad rule, matcher crash).
    /// Fails the task without reaching an agent (fail-closed).
    #[error("Guardrail error: {0}")]
    Guardrail(String),

    /// The access policy denied the (user, capability) pair.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// An agent with the same id is already registered.
    #[error("Duplicate agent: {0}")]
    DuplicateAgent(Uuid),

    /// The registry is empty or no agent matches the requested kind.
    #[error("No agent available: {0}")]
    NoAgentAvailable(String),

    /// A remote invocation exceeded the agent's configured deadline.
    #[error("Agent timed out after {0:?}")]
    AgentTimeout(Duration),

    /// The remote side reported a failure. Retryable.
    #[error("Agent invocation error: {0}")]
    AgentInvocation(String),

    /// The retry budget ran out; carries the terminal underlying error.
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total invocation attempts made, including the first.
        attempts: u32,
        /// The failure observed on the final attempt.
        last: Box<ConductorError>,
    },

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`ConductorError`].
pub type ConductorResult<T> = Result<T, ConductorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConductorError::Validation("query must not be empty".into());
        assert_eq!(err.to_string(), "Validation error: query must not be empty");
    }

    #[test]
    fn test_retries_exhausted_carries_last_error() {
        let err = ConductorError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ConductorError::AgentTimeout(Duration::from_secs(2))),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("timed out"));
        match err {
            ConductorError::RetriesExhausted { last, .. } => {
                assert!(matches!(*last, ConductorError::AgentTimeout(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ConductorError = json_err.into();
        assert!(matches!(err, ConductorError::Json(_)));
    }
}
