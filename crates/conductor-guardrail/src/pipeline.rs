use crate::access::{AccessPolicy, AllowAll};
use crate::audit::{AuditRecord, AuditSink, NullAuditSink};
use crate::config::GuardrailConfig;
use crate::pii::{PiiRule, PiiScanner};
use conductor_core::{
    AgentKind, ConductorError, ConductorResult, Finding, FindingKind, TaskRequest,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// The compliance pipeline wrapped around every agent invocation.
///
/// `apply_pre` runs before dispatch (access control, then PII masking of the
/// query); `apply_post` runs on the raw agent result (PII masking of every
/// string leaf). Both are pure over their input and the pipeline
/// configuration, apart from delegating findings to the audit sink.
pub struct GuardrailPipeline {
    config: GuardrailConfig,
    scanner: PiiScanner,
    access: Arc<dyn AccessPolicy>,
    sink: Arc<dyn AuditSink>,
}

impl GuardrailPipeline {
    /// Build a pipeline with the default rule set and an allow-all policy.
    ///
    /// Fails with [`ConductorError::Guardrail`] on a malformed rule set;
    /// a broken pipeline never passes traffic through (fail-closed).
    pub fn new(config: GuardrailConfig, sink: Arc<dyn AuditSink>) -> ConductorResult<Self> {
        Ok(Self {
            config,
            scanner: PiiScanner::with_defaults()?,
            access: Arc::new(AllowAll),
            sink,
        })
    }

    /// Build a pipeline with defaults and no audit output.
    pub fn with_defaults() -> ConductorResult<Self> {
        Self::new(GuardrailConfig::default(), Arc::new(NullAuditSink))
    }

    /// Replace the PII rule set.
    pub fn with_rules(mut self, rules: &[PiiRule]) -> ConductorResult<Self> {
        self.scanner = PiiScanner::new(rules)?;
        Ok(self)
    }

    /// Replace the access policy.
    pub fn with_access_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.access = policy;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }

    /// Pre-invocation stage: access check for the target capability, then
    /// PII masking of the query.
    ///
    /// On deny, records the denial and returns [`ConductorError::AccessDenied`]
    /// so the engine produces a `rejected` response without invoking any
    /// agent.
    pub fn apply_pre(
        &self,
        request: &TaskRequest,
        target_kind: &AgentKind,
    ) -> ConductorResult<(TaskRequest, Vec<Finding>)> {
        if self.config.access_control && !self.access.allow(&request.user_id, target_kind) {
            warn!(
                request_id = %request.id,
                user_id = %request.user_id,
                kind = %target_kind,
                "access denied"
            );
            if self.config.audit_logging {
                self.sink.record(
                    AuditRecord::new(
                        request.id,
                        vec![Finding::policy(FindingKind::AccessDenied)],
                    )
                    .with_encryption_required(self.config.encryption_required),
                );
            }
            return Err(ConductorError::AccessDenied(format!(
                "user {} may not invoke {} agents",
                request.user_id, target_kind
            )));
        }

        let mut sanitized = request.clone();
        let mut findings = Vec::new();
        if self.config.pii_detection {
            let (masked, pii) = self.scanner.mask(&request.query);
            if !pii.is_empty() {
                warn!(
                    request_id = %request.id,
                    detections = pii.len(),
                    "pii detected in request"
                );
            }
            sanitized.query = masked;
            findings = pii;
        }

        if self.config.audit_logging {
            self.sink.record(
                AuditRecord::new(request.id, findings.clone())
                    .with_request_snapshot(sanitized.query.clone())
                    .with_encryption_required(self.config.encryption_required),
            );
        }

        debug!(request_id = %request.id, findings = findings.len(), "guardrail pre complete");
        Ok((sanitized, findings))
    }

    /// Post-invocation stage: PII masking of every string leaf in the raw
    /// agent result.
    pub fn apply_post(
        &self,
        request_id: Uuid,
        result: &serde_json::Value,
    ) -> ConductorResult<(serde_json::Value, Vec<Finding>)> {
        let mut sanitized = result.clone();
        let mut findings = Vec::new();
        if self.config.pii_detection {
            self.mask_value(&mut sanitized, &mut findings);
            if !findings.is_empty() {
                warn!(
                    request_id = %request_id,
                    detections = findings.len(),
                    "pii detected in response"
                );
            }
        }

        if self.config.audit_logging {
            self.sink.record(
                AuditRecord::new(request_id, findings.clone())
                    .with_response_snapshot(sanitized.to_string())
                    .with_encryption_required(self.config.encryption_required),
            );
        }

        debug!(request_id = %request_id, findings = findings.len(), "guardrail post complete");
        Ok((sanitized, findings))
    }

    fn mask_value(&self, value: &mut serde_json::Value, findings: &mut Vec<Finding>) {
        match value {
            serde_json::Value::String(text) => {
                let (masked, mut found) = self.scanner.mask(text);
                if !found.is_empty() {
                    *text = masked;
                    findings.append(&mut found);
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    self.mask_value(item, findings);
                }
            }
            serde_json::Value::Object(map) => {
                for item in map.values_mut() {
                    self.mask_value(item, findings);
                }
            }
            _ => {}
        }
    }
}
