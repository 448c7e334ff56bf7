//! Integration tests for the complete Vera pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Framework JSON → DF-QuAD → Decision → sealed trace
//! - Sealed trace → contestation → linked trace
//! - Trace stores → reload → integrity verification
//!
//! Run with: cargo test --test integration_tests

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;
use vera_core::toy_case::{toy_claim, toy_sources, toy_trace, toy_trace_input};
use vera_core::{
    AuditTrace, AuditTraceInput, Contestation, ContestOptions, DecisionLabel, DecisionPolicy,
    DirectoryTraceStore, InMemoryTraceStore, StoreError, TraceId, TraceStore, Uncertainty,
    VeraConfig,
};

fn framework_json() -> serde_json::Value {
    serde_json::json!({
        "rootClaimId": "arg-root",
        "arguments": [
            {"id": "arg-root", "content": "Grant the permit.", "baseScore": 0.5, "sourceRefs": ["src-1111"]},
            {"id": "arg-pro", "content": "Zoning allows it.", "baseScore": 0.9, "sourceRefs": ["src-1111"]},
            {"id": "arg-con", "content": "Neighbours object.", "baseScore": 0.3, "sourceRefs": ["src-2222"]}
        ],
        "relations": [
            {"id": "rel-1", "from": "arg-pro", "to": "arg-root", "type": "support"},
            {"id": "rel-2", "from": "arg-con", "to": "arg-root", "type": "attack"}
        ]
    })
}

// ============================================================================
// Framework → Sealed Trace
// ============================================================================

#[test]
fn test_seal_from_raw_framework_json() {
    let input = AuditTraceInput::new(
        "0.1.0",
        toy_claim().unwrap(),
        serde_json::from_value::<vera_core::ArgumentationFramework>(framework_json()).unwrap(),
        toy_sources().unwrap(),
        Uncertainty::minimal("Moderate confidence.").unwrap(),
    );
    let trace = AuditTrace::seal(input).unwrap();

    // 0.5 + 0.5 * (0.9 - 0.3)
    assert_relative_eq!(trace.framework().final_strength(), 0.8, epsilon = 1e-12);
    assert_eq!(trace.decision().label(), DecisionLabel::Supported);
    assert_eq!(
        trace.integrity().sources_hash,
        vera_integrity::hash(trace.sources()).unwrap()
    );
    assert_eq!(
        trace.integrity().claim_hash,
        vera_integrity::hash(trace.claim()).unwrap()
    );
}

#[test]
fn test_seal_input_document_with_raw_framework() {
    let mut document = serde_json::to_value(toy_trace_input(false).unwrap()).unwrap();
    document["framework"] = framework_json();
    document.as_object_mut().unwrap().remove("decision");
    document.as_object_mut().unwrap().remove("traceId");

    let input: AuditTraceInput = serde_json::from_value(document).unwrap();
    let policy = DecisionPolicy::three_way(0.75, 0.1);
    let trace = AuditTrace::seal_with(input, &policy).unwrap();
    assert_eq!(trace.decision().label(), DecisionLabel::Indeterminate);
    assert_eq!(trace.decision().threshold(), 0.75);
    assert!(trace.trace_id().as_str().starts_with("trace-"));
}

#[test]
fn test_config_policy_flows_into_contest() {
    let config: VeraConfig = serde_json::from_str(
        r#"{"decision": {"threshold": 0.5, "indeterminateHalfWidth": 0.0},
            "recompute": {"indeterminateHalfWidth": 0.2}}"#,
    )
    .unwrap();
    let trace = toy_trace(false).unwrap();
    // 0.492 -> 0.528: both inside the 0.3..0.7 band
    let next = trace
        .contest(
            &Contestation::base_score_modification("arg-c3", 0.1, "stale").unwrap(),
            &config.contest_options(),
        )
        .unwrap();
    let meta = next.recompute_metadata().unwrap();
    assert!(!meta.decision_changed);
    assert_eq!(next.decision().label(), DecisionLabel::Supported);
}

// ============================================================================
// Contestation Chains
// ============================================================================

#[test]
fn test_contestation_chain_keeps_every_trace_verifiable() {
    let first = toy_trace(false).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let second = first
        .contest(
            &Contestation::argument_removal("arg-d4", "exception withdrawn").with_submitted_at(at),
            &ContestOptions {
                trace_id: Some("trace-0000bbbb".into()),
                created_at: Some(at),
                ..ContestOptions::default()
            },
        )
        .unwrap();
    let third = second
        .contest(
            &Contestation::base_score_modification("arg-b2", 1.0, "evidence confirmed").unwrap(),
            &ContestOptions {
                trace_id: Some("trace-0000cccc".into()),
                ..ContestOptions::default()
            },
        )
        .unwrap();

    for trace in [&first, &second, &third] {
        assert!(trace.verify_integrity().unwrap().valid, "{}", trace.trace_id());
    }
    assert_eq!(second.created_at(), at);
    // arg-d4 backs the attacker, so dropping it helps the root
    assert!(second.framework().final_strength() > first.framework().final_strength());
    assert!(third.framework().final_strength() > second.framework().final_strength());
    assert_eq!(
        third.recompute_metadata().unwrap().prior_trace_id,
        Some(TraceId::from("trace-0000bbbb"))
    );
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[test]
fn test_persistence_across_restarts() {
    let dir = tempdir().unwrap();
    let first = toy_trace(false).unwrap();
    let second = first
        .contest(
            &Contestation::argument_removal("arg-c3", "x"),
            &ContestOptions {
                trace_id: Some("trace-0000bbbb".into()),
                ..ContestOptions::default()
            },
        )
        .unwrap();

    {
        let store = DirectoryTraceStore::open(dir.path()).unwrap();
        store.save(&first).unwrap();
        store.save(&second).unwrap();
    }

    let reopened = DirectoryTraceStore::open(dir.path()).unwrap();
    let lineage = reopened.lineage(second.trace_id()).unwrap();
    assert_eq!(lineage.len(), 2);
    assert_eq!(lineage[0], second);
    assert_eq!(lineage[1], first);
}

// ============================================================================
// Concurrent Access Tests
// ============================================================================

#[test]
fn test_concurrent_saves() {
    let store = Arc::new(InMemoryTraceStore::new());
    let base = Arc::new(toy_trace(false).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let base = Arc::clone(&base);
            thread::spawn(move || {
                let trace = base
                    .contest(
                        &Contestation::base_score_modification("arg-b2", f64::from(i) / 10.0, "x")
                            .unwrap(),
                        &ContestOptions {
                            trace_id: Some(format!("trace-{i:04}").into()),
                            ..ContestOptions::default()
                        },
                    )
                    .unwrap();
                store.save(&trace).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.list().unwrap().len(), 8);
}

#[test]
fn test_concurrent_conflicting_directory_saves() {
    let first = toy_trace(false).unwrap();
    let mut input = toy_trace_input(false).unwrap();
    input.version = "0.2.0".into();
    let rival = AuditTrace::seal(input).unwrap();
    assert_eq!(first.trace_id(), rival.trace_id());

    for _ in 0..50 {
        let dir = tempdir().unwrap();
        let store = Arc::new(DirectoryTraceStore::open(dir.path()).unwrap());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [first.clone(), rival.clone()]
            .into_iter()
            .map(|trace| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.save(&trace).map(|()| trace)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<&AuditTrace> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "exactly one save must win");
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(StoreError::Conflict(_)))));
        assert_eq!(store.get(first.trace_id()).unwrap().as_ref(), Some(winners[0]));
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_unsupported_contestation_is_refused() {
    let trace = toy_trace(false).unwrap();
    let contestation: Contestation = serde_json::from_value(serde_json::json!({
        "id": "contest-9",
        "type": "assumption_challenge",
        "challenge": "assumption is wrong",
        "submittedAt": "2024-01-01T00:00:00Z",
        "targetArgumentId": "arg-b2",
        "targetAssumptionId": "assumption-1"
    }))
    .unwrap();
    let err = trace
        .contest(&contestation, &ContestOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("assumption_challenge"), "{err}");
}

#[test]
fn test_invalid_trace_document_rejected() {
    let mut document = serde_json::to_value(toy_trace(false).unwrap()).unwrap();
    document["decision"]["finalStrength"] = serde_json::json!(1.5);
    assert!(serde_json::from_value::<AuditTrace>(document).is_err());
}
