//! Compliance guardrails applied around every agent invocation.
//!
//! Provides PII detection and masking, access control, and an audit trail,
//! composed into a pipeline the orchestration engine runs before and after
//! each dispatch. The pipeline is fail-closed: a malformed rule set fails
//! construction rather than silently passing traffic through.
//!
//! # Main types
//!
//! - [`GuardrailPipeline`] — Pre/post stages wrapping every dispatch.
//! - [`GuardrailConfig`] — Which checks are active.
//! - [`PiiScanner`] / [`PiiRule`] — Ordered pattern matchers with canonical
//!   redaction tokens.
//! - [`AccessPolicy`] — Predicate over (user, capability kind).
//! - [`AuditSink`] / [`AuditRecord`] — Fire-and-forget trail of findings.

/// Access control policies.
pub mod access;
/// Audit sink abstraction and implementations.
pub mod audit;
/// Guardrail configuration.
pub mod config;
/// PII rules and the masking scanner.
pub mod pii;
/// The pre/post guardrail pipeline.
pub mod pipeline;

pub use access::{AccessPolicy, AllowAll, KindAllowList};
pub use audit::{AuditRecord, AuditSink, JsonlAuditSink, MemoryAuditSink, NullAuditSink};
pub use config::GuardrailConfig;
pub use pii::{default_rules, PiiRule, PiiScanner};
pub use pipeline::GuardrailPipeline;
