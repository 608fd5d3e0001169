//! The Conductor orchestration engine.
//!
//! Accepts task requests, fixes a target capability (explicit preference or
//! keyword heuristic), runs the guardrail pre stage, resolves an agent from
//! the registry, invokes it through an injected transport under retry and
//! timeout discipline, runs the guardrail post stage, and returns a terminal
//! response. Batches fan out concurrently with bounded parallelism and
//! order-preserving collection.
//!
//! # Main types
//!
//! - [`Orchestrator`] — Top-level engine exposing `submit` / `submit_batch`.
//! - [`AgentRegistry`] — Registration-ordered set of known agents.
//! - [`AgentTransport`] / [`AgentInvoker`] — The abstract remote call and its
//!   deadline enforcement.
//! - [`RetryPolicy`] — Bounded exponential backoff with jitter.
//! - [`SelectionPolicy`] — Content-based capability classification.
//! - [`EngineMetrics`] — Task outcome counters.

/// Engine configuration.
pub mod config;
/// The orchestration engine and health checks.
pub mod engine;
/// Task outcome metrics.
pub mod metrics;
/// The agent registry.
pub mod registry;
/// The retry controller.
pub mod retry;
/// Content-based agent selection.
pub mod selection;
/// The transport abstraction and deadline-enforcing invoker.
pub mod transport;

pub use config::EngineConfig;
pub use engine::{AgentHealth, HealthReport, HealthStatus, Orchestrator};
pub use metrics::{EngineMetrics, TaskCounters};
pub use registry::AgentRegistry;
pub use retry::{is_retryable, retry_with_backoff, worst_case_budget, RetryPolicy};
pub use selection::{KeywordRule, SelectionPolicy};
pub use transport::{AgentInvoker, AgentTransport, InvocationPayload};
