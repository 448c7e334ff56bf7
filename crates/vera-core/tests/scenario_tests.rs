use approx::assert_relative_eq;
use serde_json::json;
use vera_core::toy_case::{toy_claim, toy_sources, toy_trace};
use vera_core::{
    predict_contestation_effect, recompute_framework, validate_framework, AuditError, AuditTrace,
    AuditTraceInput, ArgumentationFramework, Contestation, ContestationEffect, Decision,
    DecisionLabel, DecisionPolicy, DfQuad, DirectoryTraceStore, GradualSemantics,
    InMemoryTraceStore, StoreError, TraceStore, Uncertainty, ValidationCode,
};

fn framework_from(value: serde_json::Value) -> ArgumentationFramework {
    serde_json::from_value(value).expect("framework JSON")
}

fn basic() -> ArgumentationFramework {
    framework_from(json!({
        "rootClaimId": "r",
        "arguments": [
            {"id": "r", "content": "root", "baseScore": 0.6, "sourceRefs": [], "assumptions": []},
            {"id": "a", "content": "attacker", "baseScore": 0.4, "sourceRefs": [], "assumptions": []},
            {"id": "b", "content": "supports a", "baseScore": 0.8, "sourceRefs": [], "assumptions": []}
        ],
        "relations": [
            {"id": "rel-1", "from": "a", "to": "r", "type": "attack"},
            {"id": "rel-2", "from": "b", "to": "a", "type": "support"}
        ]
    }))
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_basic_evaluation_scenario() {
    let evaluated = DfQuad.evaluate(&basic()).unwrap();
    assert_relative_eq!(evaluated.strength(&"b".into()).unwrap(), 0.8);
    assert_relative_eq!(evaluated.strength(&"a".into()).unwrap(), 0.88, epsilon = 1e-12);
    assert_relative_eq!(evaluated.final_strength(), 0.072, epsilon = 1e-12);

    let decision =
        Decision::from_strength(evaluated.final_strength(), "r holds", &DecisionPolicy::default())
            .unwrap();
    assert_eq!(decision.label(), DecisionLabel::Contested);
    assert_eq!(decision.threshold(), 0.5);
}

#[test]
fn test_evaluated_json_shape() {
    let evaluated = DfQuad.evaluate(&basic()).unwrap();
    let json = serde_json::to_value(&evaluated).unwrap();
    assert_eq!(json["rootClaimId"], "r");
    assert_eq!(json["semanticsUsed"], "df-quad");
    assert!(json["evaluatedAt"].is_string());
    assert!(json["arguments"][0]["computedStrength"].is_number());
}

#[test]
fn test_out_of_range_score_rejected_at_parse() {
    let result: Result<ArgumentationFramework, _> = serde_json::from_value(json!({
        "rootClaimId": "r",
        "arguments": [{"id": "r", "content": "root", "baseScore": 1.2}],
        "relations": []
    }));
    assert!(result.is_err());
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_tree_degree_and_cycle_reported() {
    let fw = framework_from(json!({
        "rootClaimId": "r",
        "arguments": [
            {"id": "r", "content": "root", "baseScore": 0.5},
            {"id": "x", "content": "x", "baseScore": 0.5},
            {"id": "y", "content": "y", "baseScore": 0.5},
            {"id": "z", "content": "z", "baseScore": 0.5}
        ],
        "relations": [
            {"id": "rel-1", "from": "x", "to": "r", "type": "attack"},
            {"id": "rel-2", "from": "x", "to": "y", "type": "support"},
            {"id": "rel-3", "from": "y", "to": "x", "type": "support"}
        ]
    }));
    let report = validate_framework(&fw);
    assert!(!report.valid);
    assert!(report.has_code(ValidationCode::InvalidTreeDegree));
    assert!(report.has_code(ValidationCode::FrameworkCycle));
    assert!(report.has_code(ValidationCode::FrameworkDisconnected));
    assert!(DfQuad.evaluate(&fw).is_err());
}

#[test]
fn test_seal_rejects_disconnected_framework() {
    let fw = framework_from(json!({
        "rootClaimId": "r",
        "arguments": [
            {"id": "r", "content": "root", "baseScore": 0.5},
            {"id": "a", "content": "a", "baseScore": 0.5},
            {"id": "island", "content": "island", "baseScore": 0.5}
        ],
        "relations": [
            {"id": "rel-1", "from": "a", "to": "r", "type": "support"}
        ]
    }));
    let input = AuditTraceInput::new(
        "0.1.0",
        toy_claim().unwrap(),
        fw,
        toy_sources().unwrap(),
        Uncertainty::minimal("Low confidence.").unwrap(),
    );
    match AuditTrace::seal(input) {
        Err(AuditError::FrameworkInvalid(message)) => {
            assert!(message.contains("INVALID_TREE_DEGREE: "), "{message}");
            assert!(message.contains("FRAMEWORK_DISCONNECTED: "), "{message}");
            assert!(message.contains("; "), "{message}");
        }
        other => panic!("expected FrameworkInvalid, got {other:?}"),
    }
}

// ============================================================================
// Contestation
// ============================================================================

#[test]
fn test_predict_and_recompute_agree_on_pro_increase() {
    let fw = basic();
    let evaluated = DfQuad.evaluate(&fw).unwrap();
    // b supports the attacker: con. The root itself is pro.
    let raise_root = Contestation::base_score_modification("r", 0.9, "stronger root").unwrap();
    assert_eq!(predict_contestation_effect(&fw, &raise_root), ContestationEffect::WillIncrease);
    let result = recompute_framework(&fw, &evaluated, &raise_root).unwrap();
    assert!(result.metadata.strength_delta > 0.0);

    let raise_b = Contestation::base_score_modification("b", 1.0, "stronger b").unwrap();
    assert_eq!(predict_contestation_effect(&fw, &raise_b), ContestationEffect::WillDecrease);
    let result = recompute_framework(&fw, &evaluated, &raise_b).unwrap();
    assert!(result.metadata.strength_delta < 0.0);
}

#[test]
fn test_contestation_chain_through_traces() {
    let first = toy_trace(false).unwrap();
    let lowered = first
        .contest(
            &Contestation::base_score_modification("arg-c3", 0.1, "policy is stale").unwrap(),
            &Default::default(),
        )
        .unwrap();
    assert!(lowered.decision().final_strength() > first.decision().final_strength());
    let meta = lowered.recompute_metadata().unwrap();
    assert_eq!(
        meta.changed_argument_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        vec!["arg-a1", "arg-c3"]
    );
    assert!(meta.diff_summary.starts_with("Contestation applied: base_score_modification."));
}

// ============================================================================
// Integrity & Stores
// ============================================================================

#[test]
fn test_tampered_strength_detected() {
    let trace = toy_trace(false).unwrap();
    let mut json = serde_json::to_value(&trace).unwrap();
    json["framework"]["arguments"][1]["computedStrength"] = json!(0.71);
    let tampered: AuditTrace = serde_json::from_value(json).unwrap();
    let report = tampered.verify_integrity().unwrap();
    assert_eq!(report.mismatches, vec!["frameworkHash", "traceHash"]);
}

#[test]
fn test_stores_round_trip() {
    let trace = toy_trace(true).unwrap();

    let memory = InMemoryTraceStore::new();
    memory.save(&trace).unwrap();
    assert_eq!(memory.get(trace.trace_id()).unwrap(), Some(trace.clone()));

    let dir = tempfile::tempdir().unwrap();
    let disk = DirectoryTraceStore::open(dir.path()).unwrap();
    disk.save(&trace).unwrap();
    assert_eq!(disk.list().unwrap(), vec![trace.trace_id().clone()]);
    let loaded = disk.get(trace.trace_id()).unwrap().unwrap();
    assert_eq!(loaded.integrity(), trace.integrity());
    assert!(matches!(
        disk.get(&"not/allowed".into()),
        Err(StoreError::InvalidId(_))
    ));
}
