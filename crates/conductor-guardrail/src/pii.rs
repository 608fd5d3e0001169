use conductor_core::{ConductorError, ConductorResult, Finding, FindingKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single PII pattern with its canonical redaction token.
///
/// Rules are configuration, not hard-coded logic: deployments can replace the
/// default set, and tests pin exact expected behavior against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiRule {
    /// The finding kind reported for matches of this rule.
    pub kind: FindingKind,
    /// Regex source; compiled once at scanner construction.
    pub pattern: String,
    /// Token every match is replaced with.
    pub token: String,
}

impl PiiRule {
    /// Create a rule.
    pub fn new(kind: FindingKind, pattern: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            token: token.into(),
        }
    }
}

/// The default ordered rule set.
///
/// Order matters: earlier rules claim spans first, and ssn/card run before
/// phone so longer digit runs are not carved up by the looser phone pattern.
/// The tokens contain neither `@` nor digits, so re-scanning masked output is
/// a no-op for this set; that property is NOT guaranteed for custom rules.
pub fn default_rules() -> Vec<PiiRule> {
    vec![
        PiiRule::new(
            FindingKind::PiiEmail,
            r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
            "[EMAIL_REDACTED]",
        ),
        PiiRule::new(
            FindingKind::PiiSsn,
            r"\b\d{3}-\d{2}-\d{4}\b",
            "[SSN_REDACTED]",
        ),
        PiiRule::new(
            FindingKind::PiiCreditCard,
            r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b",
            "[CREDIT_CARD_REDACTED]",
        ),
        PiiRule::new(
            FindingKind::PiiPhone,
            r"\b(?:\+?\d{1,3}[-. ]?)?(?:\(\d{3}\)[-. ]?|\d{3}[-. ])\d{3}[-. ]?\d{4}\b",
            "[PHONE_REDACTED]",
        ),
    ]
}

#[derive(Debug)]
struct CompiledRule {
    kind: FindingKind,
    regex: Regex,
    token: String,
}

/// Scans free text for PII and replaces matches with canonical tokens.
#[derive(Debug)]
pub struct PiiScanner {
    rules: Vec<CompiledRule>,
}

impl PiiScanner {
    /// Compile a rule set. A malformed pattern fails construction
    /// (fail-closed) with a [`ConductorError::Guardrail`].
    pub fn new(rules: &[PiiRule]) -> ConductorResult<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&rule.pattern).map_err(|e| {
                ConductorError::Guardrail(format!(
                    "invalid PII pattern for {:?}: {e}",
                    rule.kind
                ))
            })?;
            compiled.push(CompiledRule {
                kind: rule.kind,
                regex,
                token: rule.token.clone(),
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Scanner over the default rule set.
    pub fn with_defaults() -> ConductorResult<Self> {
        Self::new(&default_rules())
    }

    /// Mask all PII in `text`, returning the masked text and one finding per
    /// claimed match.
    ///
    /// Matchers run in fixed rule order over the original text; a later
    /// match that overlaps an already-claimed span is discarded, so output
    /// is deterministic and byte-identical across runs.
    pub fn mask(&self, text: &str) -> (String, Vec<Finding>) {
        // (start, end, rule index), claimed in rule-priority order.
        let mut claimed: Vec<(usize, usize, usize)> = Vec::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            for m in rule.regex.find_iter(text) {
                let overlaps = claimed
                    .iter()
                    .any(|&(start, end, _)| m.start() < end && start < m.end());
                if !overlaps {
                    claimed.push((m.start(), m.end(), idx));
                }
            }
        }
        claimed.sort_by_key(|&(start, _, _)| start);

        let mut masked = String::with_capacity(text.len());
        let mut findings = Vec::with_capacity(claimed.len());
        let mut cursor = 0;
        for (start, end, idx) in claimed {
            let rule = &self.rules[idx];
            masked.push_str(&text[cursor..start]);
            masked.push_str(&rule.token);
            findings.push(Finding::masked(rule.kind, (start, end), rule.token.clone()));
            cursor = end;
        }
        masked.push_str(&text[cursor..]);
        (masked, findings)
    }

    /// Number of compiled rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> PiiScanner {
        PiiScanner::with_defaults().unwrap()
    }

    #[test]
    fn test_mask_email() {
        let (masked, findings) = scanner().mask("Contact me at john.doe@example.com for details");
        assert_eq!(masked, "Contact me at [EMAIL_REDACTED] for details");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::PiiEmail);
        assert_eq!(findings[0].span, Some((14, 34)));
    }

    #[test]
    fn test_mask_phone_formats() {
        let (masked, findings) = scanner().mask("Call me at 555-123-4567 or 555.987.6543");
        assert_eq!(masked, "Call me at [PHONE_REDACTED] or [PHONE_REDACTED]");
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.kind == FindingKind::PiiPhone));
    }

    #[test]
    fn test_mask_international_phone() {
        let (masked, _) = scanner().mask("reach +1 555 123 4567 anytime");
        assert!(!masked.contains("4567"));
        assert!(masked.contains("[PHONE_REDACTED]"));
    }

    #[test]
    fn test_mask_ssn_not_claimed_by_phone() {
        let (masked, findings) = scanner().mask("My SSN is 123-45-6789");
        assert_eq!(masked, "My SSN is [SSN_REDACTED]");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::PiiSsn);
    }

    #[test]
    fn test_mask_credit_card() {
        let (masked, findings) = scanner().mask("card 4111-1111-1111-1111 on file");
        assert_eq!(masked, "card [CREDIT_CARD_REDACTED] on file");
        assert_eq!(findings[0].kind, FindingKind::PiiCreditCard);
    }

    #[test]
    fn test_card_claims_span_before_phone() {
        // The phone rule would match fragments of the card number; the card
        // rule runs first and claims the whole span.
        let (masked, findings) = scanner().mask("4111 1111 1111 1111");
        assert_eq!(masked, "[CREDIT_CARD_REDACTED]");
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_mask_mixed_text() {
        let (masked, findings) =
            scanner().mask("Call 555-123-4567 or email john@example.com about 123-45-6789");
        assert!(!masked.contains("555-123-4567"));
        assert!(!masked.contains("john@example.com"));
        assert!(!masked.contains("123-45-6789"));
        assert!(masked.contains("[PHONE_REDACTED]"));
        assert!(masked.contains("[EMAIL_REDACTED]"));
        assert!(masked.contains("[SSN_REDACTED]"));
        assert_eq!(findings.len(), 3);
        // Findings are ordered by span start regardless of rule order.
        let starts: Vec<usize> = findings.iter().map(|f| f.span.unwrap().0).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_mask_deterministic() {
        let text = "a@b.com and 555-123-4567 and 4111111111111111";
        let first = scanner().mask(text);
        let second = scanner().mask(text);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn test_masked_output_is_stable_under_rescan() {
        let (masked, _) = scanner().mask("mail sue@corp.io, card 4111 1111 1111 1111");
        let (rescanned, findings) = scanner().mask(&masked);
        assert_eq!(rescanned, masked);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_clean_text_untouched() {
        let text = "summarize last quarter's incident postmortems";
        let (masked, findings) = scanner().mask(text);
        assert_eq!(masked, text);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_invalid_pattern_fails_closed() {
        let rules = vec![PiiRule::new(FindingKind::PiiEmail, "([", "[X]")];
        let err = PiiScanner::new(&rules).unwrap_err();
        assert!(matches!(err, ConductorError::Guardrail(_)));
    }
}
