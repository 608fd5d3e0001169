//! End-to-end guardrail pipeline tests.
//!
//! Verifies masking across all PII classes, rescan stability, access
//! denial short-circuiting, and concurrent audit attribution.

use conductor_core::{AgentKind, ConductorError, FindingKind, TaskRequest};
use conductor_guardrail::{
    GuardrailConfig, GuardrailPipeline, KindAllowList, MemoryAuditSink, PiiRule,
};
use std::sync::Arc;

fn request(user: &str, query: &str) -> TaskRequest {
    TaskRequest::new(user, query).unwrap()
}

#[test]
fn masks_every_default_pii_class() {
    let pipeline = GuardrailPipeline::with_defaults().unwrap();
    let query = "I'm jane.doe@corp.io, call 555-123-4567, \
                 SSN 123-45-6789, card 4111-1111-1111-1111";
    let (sanitized, findings) = pipeline
        .apply_pre(&request("jane", query), &AgentKind::Inference)
        .unwrap();

    for sensitive in [
        "jane.doe@corp.io",
        "555-123-4567",
        "123-45-6789",
        "4111-1111-1111-1111",
    ] {
        assert!(
            !sanitized.query.contains(sensitive),
            "sensitive substring survived masking: {sensitive}"
        );
    }
    for token in [
        "[EMAIL_REDACTED]",
        "[PHONE_REDACTED]",
        "[SSN_REDACTED]",
        "[CREDIT_CARD_REDACTED]",
    ] {
        assert_eq!(
            sanitized.query.matches(token).count(),
            1,
            "expected exactly one {token}"
        );
    }
    assert_eq!(findings.len(), 4);
}

#[test]
fn rescan_of_masked_output_is_a_no_op() {
    let pipeline = GuardrailPipeline::with_defaults().unwrap();
    let (first, first_findings) = pipeline
        .apply_pre(
            &request("jane", "email a@b.com, phone 555-123-4567"),
            &AgentKind::Inference,
        )
        .unwrap();
    assert_eq!(first_findings.len(), 2);

    let (second, second_findings) = pipeline.apply_pre(&first, &AgentKind::Inference).unwrap();
    assert_eq!(second.query, first.query);
    assert!(second_findings.is_empty());
}

#[test]
fn denial_short_circuits_before_masking() {
    let sink = Arc::new(MemoryAuditSink::new());
    let policy = KindAllowList::new().with_user("analyst", vec![AgentKind::Analytics]);
    let pipeline = GuardrailPipeline::new(GuardrailConfig::default(), sink.clone())
        .unwrap()
        .with_access_policy(Arc::new(policy));

    let err = pipeline
        .apply_pre(
            &request("analyst", "notify ops about a@b.com"),
            &AgentKind::Notification,
        )
        .unwrap_err();
    assert!(matches!(err, ConductorError::AccessDenied(_)));

    // The only audit entry is the denial; no masking entry was produced.
    let records = sink.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].findings[0].kind, FindingKind::AccessDenied);
    assert!(records[0].request_snapshot.is_none());
}

#[test]
fn custom_rules_replace_defaults() {
    let rules = vec![PiiRule::new(
        FindingKind::PiiEmail,
        r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
        "<redacted-email>",
    )];
    let pipeline = GuardrailPipeline::with_defaults()
        .unwrap()
        .with_rules(&rules)
        .unwrap();
    let (sanitized, _) = pipeline
        .apply_pre(
            &request("jane", "a@b.com and 555-123-4567"),
            &AgentKind::Inference,
        )
        .unwrap();
    // Only the email rule remains; the phone number passes through.
    assert_eq!(sanitized.query, "<redacted-email> and 555-123-4567");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_audit_entries_keep_their_request_ids() {
    let sink = Arc::new(MemoryAuditSink::new());
    let pipeline = Arc::new(
        GuardrailPipeline::new(GuardrailConfig::default(), sink.clone()).unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..16 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            let req = request("jane", &format!("message {i} for a@b.com"));
            let id = req.id;
            pipeline.apply_pre(&req, &AgentKind::Inference).unwrap();
            id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    let records = sink.snapshot();
    assert_eq!(records.len(), 16);
    for id in ids {
        assert_eq!(
            records.iter().filter(|r| r.request_id == id).count(),
            1,
            "each request id appears exactly once"
        );
    }
}
