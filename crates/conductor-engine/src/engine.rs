use crate::config::EngineConfig;
use crate::metrics::EngineMetrics;
use crate::registry::AgentRegistry;
use crate::retry::{is_retryable, retry_with_backoff, worst_case_budget};
use crate::selection::SelectionPolicy;
use crate::transport::{AgentInvoker, AgentTransport, InvocationPayload};
use chrono::{DateTime, Utc};
use conductor_core::{
    AgentDescriptor, AgentKind, ConductorError, ConductorResult, Finding, FindingKind,
    TaskRequest, TaskResponse, TaskState, TaskStatus,
};
use conductor_guardrail::GuardrailPipeline;
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Health of a single registered agent, as observed by a best-effort ping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHealth {
    /// The agent's id.
    pub agent_id: Uuid,
    /// The agent's name.
    pub name: String,
    /// The agent's capability kind.
    pub kind: AgentKind,
    /// Whether the ping came back in time.
    pub healthy: bool,
    /// Round-trip latency of a successful ping.
    pub latency_ms: Option<u64>,
    /// The ping failure, when unhealthy.
    pub error: Option<String>,
}

/// Overall engine health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every registered agent answered its ping.
    Healthy,
    /// The registry is empty or at least one agent did not answer.
    Degraded,
}

/// Result of [`Orchestrator::health_check`]. Degraded agents are reported,
/// never hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Per-agent ping results.
    pub agents: Vec<AgentHealth>,
    /// Seconds since the engine was created.
    pub uptime_seconds: u64,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
}

/// The orchestration engine.
///
/// Every submitted task flows engine → guardrail(pre) → agent →
/// guardrail(post) → engine; the engine converts every internal failure into
/// a terminal [`TaskResponse`] and never raises past its `submit` /
/// `submit_batch` contract. Only registry management errors surface to the
/// caller.
pub struct Orchestrator {
    config: EngineConfig,
    registry: Arc<AgentRegistry>,
    guardrails: Arc<GuardrailPipeline>,
    invoker: AgentInvoker,
    selection: SelectionPolicy,
    metrics: Arc<EngineMetrics>,
    started_at: Instant,
}

impl Orchestrator {
    /// Create an engine with the default selection policy.
    pub fn new(
        config: EngineConfig,
        guardrails: GuardrailPipeline,
        transport: Arc<dyn AgentTransport>,
    ) -> Self {
        info!(
            name = %config.name,
            max_concurrent = config.max_concurrent_tasks,
            "orchestrator initialized"
        );
        Self {
            config,
            registry: Arc::new(AgentRegistry::new()),
            guardrails: Arc::new(guardrails),
            invoker: AgentInvoker::new(transport),
            selection: SelectionPolicy::default(),
            metrics: Arc::new(EngineMetrics::new()),
            started_at: Instant::now(),
        }
    }

    /// Replace the selection policy.
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection = policy;
        self
    }

    /// The agent registry.
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Task outcome counters.
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Register an agent. Registration errors are programmer errors and
    /// surface to the caller.
    pub async fn register_agent(&self, agent: AgentDescriptor) -> ConductorResult<()> {
        self.registry.register(agent).await
    }

    /// Remove an agent. Returns whether it was present.
    pub async fn unregister_agent(&self, id: Uuid) -> bool {
        self.registry.unregister(id).await
    }

    /// Snapshot of all registered agents.
    pub async fn list_agents(&self) -> Vec<AgentDescriptor> {
        self.registry.list().await
    }

    /// Process one task to a terminal response.
    pub async fn submit(&self, request: TaskRequest) -> TaskResponse {
        let start = Instant::now();
        self.metrics.record_submitted().await;
        let response = self.process(request, start).await;
        self.metrics.record_outcome(response.status).await;
        response
    }

    /// Process a batch concurrently, bounded by `max_concurrent_tasks`.
    ///
    /// Responses are returned in input order regardless of completion order,
    /// and one task's failure never affects its siblings. Dropping the
    /// returned future cancels all still-pending tasks along with their
    /// in-flight calls and backoff timers.
    pub async fn submit_batch(&self, requests: Vec<TaskRequest>) -> Vec<TaskResponse> {
        let batch_size = requests.len();
        info!(batch_size, "batch processing started");

        let concurrency = self.config.max_concurrent_tasks.max(1);
        let responses: Vec<TaskResponse> = stream::iter(requests)
            .map(|request| self.submit(request))
            .buffered(concurrency)
            .collect()
            .await;

        info!(batch_size, "batch processing completed");
        responses
    }

    /// Ping every registered agent through the transport.
    ///
    /// Best-effort: never returns an error; unreachable agents are reported
    /// as degraded.
    pub async fn health_check(&self) -> HealthReport {
        let agents = self.registry.list().await;

        let pings = agents.iter().map(|agent| async move {
            let payload = InvocationPayload {
                request_id: Uuid::new_v4(),
                user_id: "health-check".to_string(),
                query: "ping".to_string(),
                metadata: HashMap::new(),
            };
            let deadline = self.config.health_check_timeout().min(agent.timeout);
            let probe = AgentDescriptor {
                timeout: deadline,
                ..agent.clone()
            };
            let start = Instant::now();
            match self.invoker.invoke(&probe, &payload).await {
                Ok(_) => AgentHealth {
                    agent_id: agent.id,
                    name: agent.name.clone(),
                    kind: agent.kind.clone(),
                    healthy: true,
                    latency_ms: Some(start.elapsed().as_millis() as u64),
                    error: None,
                },
                Err(err) => AgentHealth {
                    agent_id: agent.id,
                    name: agent.name.clone(),
                    kind: agent.kind.clone(),
                    healthy: false,
                    latency_ms: None,
                    error: Some(err.to_string()),
                },
            }
        });
        let checks = join_all(pings).await;

        let status = if !checks.is_empty() && checks.iter().all(|a| a.healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        HealthReport {
            status,
            agents: checks,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            checked_at: Utc::now(),
        }
    }

    /// The straight-line per-task pipeline.
    async fn process(&self, request: TaskRequest, start: Instant) -> TaskResponse {
        let request_id = request.id;
        let mut state = TaskState::Received;
        debug!(request_id = %request_id, state = %state, "task state");

        // Requests normally validate at construction; hand-built ones are
        // re-checked here so a malformed query never reaches the transport.
        if request.query.trim().is_empty() || request.user_id.trim().is_empty() {
            let err = ConductorError::Validation("query and user id must not be empty".to_string());
            warn!(request_id = %request_id, error = %err, "malformed request");
            return TaskResponse::failure(
                request_id,
                TaskStatus::Failed,
                err.to_string(),
                start.elapsed(),
                vec![Finding::policy(FindingKind::ValidationError)],
            );
        }

        // The target capability is fixed before the pre stage so the access
        // predicate sees the requested kind; the concrete agent is looked up
        // afterwards.
        let target_kind = match &request.preferred_kind {
            Some(kind) => kind.clone(),
            None => self.selection.classify(&request.query),
        };

        state = TaskState::GuardrailPre;
        debug!(request_id = %request_id, state = %state, kind = %target_kind, "task state");
        let (sanitized, mut findings) = match self.guardrails.apply_pre(&request, &target_kind) {
            Ok(pair) => pair,
            Err(ConductorError::AccessDenied(detail)) => {
                info!(request_id = %request_id, state = %TaskState::Rejected, "task rejected");
                return TaskResponse::failure(
                    request_id,
                    TaskStatus::Rejected,
                    detail,
                    start.elapsed(),
                    vec![Finding::policy(FindingKind::AccessDenied)],
                );
            }
            Err(err) => {
                // Fail-closed: a broken pipeline never lets a task through.
                error!(request_id = %request_id, error = %err, "guardrail pre stage failed");
                return TaskResponse::failure(
                    request_id,
                    TaskStatus::Failed,
                    err.to_string(),
                    start.elapsed(),
                    vec![],
                );
            }
        };

        state = TaskState::AgentResolution;
        debug!(request_id = %request_id, state = %state, "task state");
        let agent = match self.resolve_target(&request, &target_kind).await {
            Ok(agent) => agent,
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "no agent available");
                return TaskResponse::failure(
                    request_id,
                    TaskStatus::Failed,
                    err.to_string(),
                    start.elapsed(),
                    findings,
                );
            }
        };

        state = TaskState::Invoking;
        debug!(
            request_id = %request_id,
            state = %state,
            agent = %agent.name,
            "task state"
        );
        let payload = InvocationPayload::from_request(&sanitized);
        let budget = worst_case_budget(&self.config.retry, agent.timeout, agent.max_retries);

        let invoker = &self.invoker;
        let agent_ref = &agent;
        let payload_ref = &payload;
        let attempt_op = |attempt: u32| async move {
            debug!(
                request_id = %payload_ref.request_id,
                agent = %agent_ref.name,
                attempt,
                "invoking agent"
            );
            invoker.invoke(agent_ref, payload_ref).await
        };
        let outcome = tokio::time::timeout(
            budget,
            retry_with_backoff(&self.config.retry, agent.max_retries, is_retryable, attempt_op),
        )
        .await;

        let raw = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                let status = terminal_status(&err);
                warn!(
                    request_id = %request_id,
                    agent = %agent.name,
                    error = %err,
                    "invocation failed terminally"
                );
                return TaskResponse::failure(
                    request_id,
                    status,
                    err.to_string(),
                    start.elapsed(),
                    findings,
                )
                .with_agent(agent.id, agent.name.clone());
            }
            Err(_elapsed) => {
                warn!(
                    request_id = %request_id,
                    agent = %agent.name,
                    budget_ms = budget.as_millis() as u64,
                    "task exceeded its overall deadline"
                );
                return TaskResponse::failure(
                    request_id,
                    TaskStatus::Timeout,
                    format!("task exceeded its deadline of {budget:?}"),
                    start.elapsed(),
                    findings,
                )
                .with_agent(agent.id, agent.name.clone());
            }
        };

        state = TaskState::GuardrailPost;
        debug!(request_id = %request_id, state = %state, "task state");
        let (result, post_findings) = match self.guardrails.apply_post(request_id, &raw) {
            Ok(pair) => pair,
            Err(err) => {
                error!(request_id = %request_id, error = %err, "guardrail post stage failed");
                return TaskResponse::failure(
                    request_id,
                    TaskStatus::Failed,
                    err.to_string(),
                    start.elapsed(),
                    findings,
                )
                .with_agent(agent.id, agent.name.clone());
            }
        };
        findings.extend(post_findings);

        state = TaskState::Completed;
        info!(
            request_id = %request_id,
            state = %state,
            agent = %agent.name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "task completed"
        );
        TaskResponse::success(
            request_id,
            agent.id,
            agent.name.clone(),
            result,
            start.elapsed(),
            findings,
        )
    }

    /// Look up the agent serving `target_kind`.
    ///
    /// An explicit preference is strict: no matching agent fails the task. A
    /// heuristic classification falls back to the first enabled agent, since
    /// the keyword mapping is best-effort.
    async fn resolve_target(
        &self,
        request: &TaskRequest,
        target_kind: &AgentKind,
    ) -> ConductorResult<AgentDescriptor> {
        if request.preferred_kind.is_some() {
            return self.registry.resolve(Some(target_kind)).await;
        }
        match self.registry.resolve(Some(target_kind)).await {
            Ok(agent) => Ok(agent),
            Err(ConductorError::NoAgentAvailable(_)) => self.registry.resolve(None).await,
            Err(err) => Err(err),
        }
    }
}

/// Map a terminal invocation error onto a response status.
fn terminal_status(err: &ConductorError) -> TaskStatus {
    match err {
        ConductorError::AgentTimeout(_) => TaskStatus::Timeout,
        ConductorError::RetriesExhausted { last, .. } => terminal_status(last),
        _ => TaskStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_terminal_status_mapping() {
        assert_eq!(
            terminal_status(&ConductorError::AgentTimeout(Duration::from_secs(1))),
            TaskStatus::Timeout
        );
        assert_eq!(
            terminal_status(&ConductorError::AgentInvocation("boom".into())),
            TaskStatus::Failed
        );
        assert_eq!(
            terminal_status(&ConductorError::RetriesExhausted {
                attempts: 3,
                last: Box::new(ConductorError::AgentTimeout(Duration::from_secs(1))),
            }),
            TaskStatus::Timeout
        );
        assert_eq!(
            terminal_status(&ConductorError::RetriesExhausted {
                attempts: 2,
                last: Box::new(ConductorError::AgentInvocation("boom".into())),
            }),
            TaskStatus::Failed
        );
    }
}
