use crate::{ConductorError, ConductorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// The capability kind an agent is suited for.
///
/// The set is closed so selection logic stays exhaustive; [`AgentKind::Custom`]
/// is the escape hatch for deployments that register kinds the engine does not
/// know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Model-inference agents (text generation, summarization, Q&A).
    Inference,
    /// Analytics agents (reporting, metrics, trend computation).
    Analytics,
    /// Notification agents (alerting, message delivery).
    Notification,
    /// A deployment-specific kind carrying its own tag.
    Custom(String),
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Inference => write!(f, "inference"),
            AgentKind::Analytics => write!(f, "analytics"),
            AgentKind::Notification => write!(f, "notification"),
            AgentKind::Custom(tag) => write!(f, "custom:{tag}"),
        }
    }
}

/// Immutable configuration of a registered agent.
///
/// Created at configuration time, validated on registration, and held by the
/// registry for the engine's process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique agent identifier.
    pub id: Uuid,
    /// Human-readable agent name.
    pub name: String,
    /// Capability kind this agent serves.
    pub kind: AgentKind,
    /// Agent purpose and capabilities.
    #[serde(default)]
    pub description: String,
    /// Opaque invocation address, interpreted by the injected transport.
    pub endpoint: String,
    /// Hard per-attempt deadline for remote invocations.
    pub timeout: Duration,
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Whether the agent participates in resolution.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Arbitrary agent-specific configuration.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl AgentDescriptor {
    /// Create a descriptor with default timeout (30s), retry budget (3) and
    /// enabled state.
    pub fn new(name: impl Into<String>, kind: AgentKind, endpoint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            description: String::new(),
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            enabled: true,
            metadata: HashMap::new(),
        }
    }

    /// Set the per-attempt invocation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget (retries after the initial attempt).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Enable or disable the agent for resolution.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Check the descriptor invariants: non-empty name and endpoint,
    /// positive timeout.
    pub fn validate(&self) -> ConductorResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConductorError::Validation(
                "agent name must not be empty".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConductorError::Validation(
                "agent endpoint must not be empty".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConductorError::Validation(
                "agent timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let agent = AgentDescriptor::new("reporter", AgentKind::Analytics, "agents://reporter");
        assert_eq!(agent.timeout, Duration::from_secs(30));
        assert_eq!(agent.max_retries, 3);
        assert!(agent.enabled);
        assert!(agent.metadata.is_empty());
        assert!(agent.validate().is_ok());
    }

    #[test]
    fn test_descriptor_builders() {
        let agent = AgentDescriptor::new("pager", AgentKind::Notification, "agents://pager")
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(1)
            .with_enabled(false)
            .with_metadata("channel", serde_json::json!("sms"));
        assert_eq!(agent.timeout, Duration::from_secs(5));
        assert_eq!(agent.max_retries, 1);
        assert!(!agent.enabled);
        assert_eq!(agent.metadata["channel"], serde_json::json!("sms"));
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let agent = AgentDescriptor::new("", AgentKind::Inference, "agents://x");
        assert!(matches!(
            agent.validate(),
            Err(crate::ConductorError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let agent = AgentDescriptor::new("x", AgentKind::Inference, "agents://x")
            .with_timeout(Duration::ZERO);
        assert!(agent.validate().is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(AgentKind::Inference.to_string(), "inference");
        assert_eq!(AgentKind::Analytics.to_string(), "analytics");
        assert_eq!(
            AgentKind::Custom("billing".to_string()).to_string(),
            "custom:billing"
        );
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&AgentKind::Analytics).unwrap();
        assert_eq!(json, "\"analytics\"");
        let custom = serde_json::to_string(&AgentKind::Custom("billing".into())).unwrap();
        assert!(custom.contains("billing"));
        let parsed: AgentKind = serde_json::from_str(&custom).unwrap();
        assert_eq!(parsed, AgentKind::Custom("billing".into()));
    }
}
