use conductor_core::{AgentDescriptor, AgentKind, ConductorError, ConductorResult};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// The set of known agents, owned by the orchestration engine.
///
/// Registration order is preserved and used as the deterministic tie-break
/// during resolution. The inner lock is read-mostly: resolution takes a read
/// lock for the duration of a lookup only, never across task I/O; writes
/// happen only through explicit register/unregister calls.
pub struct AgentRegistry {
    agents: RwLock<Vec<AgentDescriptor>>,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(Vec::new()),
        }
    }

    /// Register an agent.
    ///
    /// Validates the descriptor invariants and fails with
    /// [`ConductorError::DuplicateAgent`] if the id is already present.
    pub async fn register(&self, agent: AgentDescriptor) -> ConductorResult<()> {
        agent.validate()?;
        let mut agents = self.agents.write().await;
        if agents.iter().any(|existing| existing.id == agent.id) {
            return Err(ConductorError::DuplicateAgent(agent.id));
        }
        info!(
            agent_id = %agent.id,
            agent_name = %agent.name,
            kind = %agent.kind,
            "agent registered"
        );
        agents.push(agent);
        Ok(())
    }

    /// Remove an agent. Returns whether it was present.
    pub async fn unregister(&self, id: Uuid) -> bool {
        let mut agents = self.agents.write().await;
        let before = agents.len();
        agents.retain(|agent| agent.id != id);
        let removed = agents.len() < before;
        if removed {
            info!(agent_id = %id, "agent unregistered");
        }
        removed
    }

    /// Resolve an agent for dispatch.
    ///
    /// With a preferred kind, returns the first enabled match in registration
    /// order; without one, the first enabled agent. Fails with
    /// [`ConductorError::NoAgentAvailable`] when the registry is empty or
    /// nothing matches.
    pub async fn resolve(
        &self,
        preferred: Option<&AgentKind>,
    ) -> ConductorResult<AgentDescriptor> {
        let agents = self.agents.read().await;
        if agents.is_empty() {
            return Err(ConductorError::NoAgentAvailable(
                "registry is empty".to_string(),
            ));
        }
        match preferred {
            Some(kind) => agents
                .iter()
                .find(|agent| agent.enabled && &agent.kind == kind)
                .cloned()
                .ok_or_else(|| {
                    ConductorError::NoAgentAvailable(format!(
                        "no enabled {kind} agent registered"
                    ))
                }),
            None => agents
                .iter()
                .find(|agent| agent.enabled)
                .cloned()
                .ok_or_else(|| {
                    ConductorError::NoAgentAvailable("all agents are disabled".to_string())
                }),
        }
    }

    /// Look up an agent by id.
    pub async fn get(&self, id: Uuid) -> Option<AgentDescriptor> {
        self.agents
            .read()
            .await
            .iter()
            .find(|agent| agent.id == id)
            .cloned()
    }

    /// Snapshot of all registered agents in registration order.
    pub async fn list(&self) -> Vec<AgentDescriptor> {
        self.agents.read().await.clone()
    }

    /// Number of registered agents.
    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    /// Whether the registry holds no agents.
    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
