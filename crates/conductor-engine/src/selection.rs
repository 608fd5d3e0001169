use conductor_core::AgentKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maps keyword hits to a capability kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// The kind selected when any keyword matches.
    pub kind: AgentKind,
    /// Lowercase keywords checked as substrings of the query.
    pub keywords: Vec<String>,
}

impl KeywordRule {
    /// Create a rule.
    pub fn new(kind: AgentKind, keywords: &[&str]) -> Self {
        Self {
            kind,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

/// The content-based selection heuristic used when a request carries no
/// explicit capability preference.
///
/// Rules are evaluated in order against the lowercased query; the first rule
/// with any keyword hit wins, and the fallback kind is returned otherwise —
/// classification is total and deterministic over the input domain. The
/// policy is configuration, not hard-coded logic: deployments can ship their
/// own rule sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionPolicy {
    rules: Vec<KeywordRule>,
    fallback: AgentKind,
}

impl SelectionPolicy {
    /// Create a policy from ordered rules and a fallback kind.
    pub fn new(rules: Vec<KeywordRule>, fallback: AgentKind) -> Self {
        Self { rules, fallback }
    }

    /// The kind used when no rule matches.
    pub fn fallback(&self) -> &AgentKind {
        &self.fallback
    }

    /// Classify a query into a capability kind.
    pub fn classify(&self, query: &str) -> AgentKind {
        let lower = query.to_lowercase();
        for rule in &self.rules {
            if rule
                .keywords
                .iter()
                .any(|keyword| lower.contains(keyword.as_str()))
            {
                debug!(kind = %rule.kind, "query classified by keyword rule");
                return rule.kind.clone();
            }
        }
        debug!(kind = %self.fallback, "query classified by fallback");
        self.fallback.clone()
    }
}

impl Default for SelectionPolicy {
    /// The shipped heuristic:
    ///
    /// 1. analytics — analyze, analysis, report, metric, trend, dashboard,
    ///    sentiment
    /// 2. notification — notify, alert, remind, announce, page
    /// 3. fallback — inference
    fn default() -> Self {
        Self::new(
            vec![
                KeywordRule::new(
                    AgentKind::Analytics,
                    &[
                        "analyze",
                        "analysis",
                        "report",
                        "metric",
                        "trend",
                        "dashboard",
                        "sentiment",
                    ],
                ),
                KeywordRule::new(
                    AgentKind::Notification,
                    &["notify", "alert", "remind", "announce", "page"],
                ),
            ],
            AgentKind::Inference,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_analytics() {
        let policy = SelectionPolicy::default();
        assert_eq!(
            policy.classify("Analyze customer sentiment from last quarter"),
            AgentKind::Analytics
        );
        assert_eq!(
            policy.classify("build the weekly REPORT"),
            AgentKind::Analytics
        );
    }

    #[test]
    fn test_classify_notification() {
        let policy = SelectionPolicy::default();
        assert_eq!(
            policy.classify("notify the on-call engineer"),
            AgentKind::Notification
        );
    }

    #[test]
    fn test_classify_fallback_total() {
        let policy = SelectionPolicy::default();
        assert_eq!(policy.classify("what is the capital of France"), AgentKind::Inference);
        assert_eq!(policy.classify(""), AgentKind::Inference);
        assert_eq!(policy.classify("   "), AgentKind::Inference);
    }

    #[test]
    fn test_rule_order_breaks_ties() {
        // "analyze" appears in the first rule, so a query hitting both rules
        // classifies as analytics.
        let policy = SelectionPolicy::default();
        assert_eq!(
            policy.classify("analyze alerts from last night"),
            AgentKind::Analytics
        );
    }

    #[test]
    fn test_classify_deterministic() {
        let policy = SelectionPolicy::default();
        let a = policy.classify("remind me tomorrow");
        let b = policy.classify("remind me tomorrow");
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_rules() {
        let policy = SelectionPolicy::new(
            vec![KeywordRule::new(
                AgentKind::Custom("billing".into()),
                &["invoice", "refund"],
            )],
            AgentKind::Inference,
        );
        assert_eq!(
            policy.classify("issue a refund for order 7"),
            AgentKind::Custom("billing".into())
        );
    }
}
