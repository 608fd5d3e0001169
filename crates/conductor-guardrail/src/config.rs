use serde::{Deserialize, Serialize};

/// Which guardrail checks are active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Scan and mask PII in queries and result payloads.
    #[serde(default = "default_true")]
    pub pii_detection: bool,
    /// Record every request/response pair with its findings to the audit sink.
    #[serde(default = "default_true")]
    pub audit_logging: bool,
    /// Check the requester against the access policy before dispatch.
    #[serde(default = "default_true")]
    pub access_control: bool,
    /// Informational flag recorded into audit entries; persisted artifacts
    /// must be encrypted at rest. Consumed by external storage, not enforced
    /// here.
    #[serde(default)]
    pub encryption_required: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            pii_detection: true,
            audit_logging: true,
            access_control: true,
            encryption_required: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuardrailConfig::default();
        assert!(config.pii_detection);
        assert!(config.audit_logging);
        assert!(config.access_control);
        assert!(!config.encryption_required);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: GuardrailConfig = serde_json::from_str("{}").unwrap();
        assert!(config.pii_detection);
        let config: GuardrailConfig =
            serde_json::from_str(r#"{"pii_detection": false, "encryption_required": true}"#)
                .unwrap();
        assert!(!config.pii_detection);
        assert!(config.encryption_required);
    }
}
