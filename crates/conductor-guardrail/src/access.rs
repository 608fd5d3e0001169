use conductor_core::AgentKind;
use std::collections::{HashMap, HashSet};

/// Predicate deciding whether a user may invoke agents of a capability kind.
///
/// Implementations are injected into the pipeline; a deny short-circuits the
/// task before any agent is invoked.
pub trait AccessPolicy: Send + Sync {
    /// Return `true` to allow the (user, kind) pair.
    fn allow(&self, user_id: &str, kind: &AgentKind) -> bool;
}

/// Permits every request. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn allow(&self, _user_id: &str, _kind: &AgentKind) -> bool {
        true
    }
}

/// Per-user allow list of capability kinds. Users without an entry are denied.
#[derive(Debug, Clone, Default)]
pub struct KindAllowList {
    allowed: HashMap<String, HashSet<AgentKind>>,
}

impl KindAllowList {
    /// Create an empty (deny-everyone) allow list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a user access to the given kinds.
    pub fn with_user(mut self, user_id: impl Into<String>, kinds: Vec<AgentKind>) -> Self {
        self.allowed
            .entry(user_id.into())
            .or_default()
            .extend(kinds);
        self
    }
}

impl AccessPolicy for KindAllowList {
    fn allow(&self, user_id: &str, kind: &AgentKind) -> bool {
        self.allowed
            .get(user_id)
            .is_some_and(|kinds| kinds.contains(kind))
    }
}
