use crate::audit::AuditTrace;
use crate::framework::ArgumentationFramework;
use crate::semantics::{DfQuad, GradualSemantics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvariantName {
    Acyclic,
    Connected,
    TreeStructure,
    ValidBaseScores,
    ValidComputedStrengths,
    SourcesReferenced,
    UncertaintyPresent,
    Deterministic,
}

/// Named pass/fail result, for diagnostics rather than request rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantCheck {
    pub invariant: InvariantName,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl InvariantCheck {
    fn new(invariant: InvariantName, passed: bool, details: Option<String>) -> Self {
        Self {
            invariant,
            passed,
            details,
        }
    }
}

pub fn all_passed(checks: &[InvariantCheck]) -> bool {
    checks.iter().all(|c| c.passed)
}

pub fn validate_invariants(framework: &impl AsRef<ArgumentationFramework>) -> Vec<InvariantCheck> {
    let framework = framework.as_ref();

    let bad_scores: Vec<String> = framework
        .arguments()
        .iter()
        .filter(|a| !(0.0..=1.0).contains(&a.base_score()))
        .map(|a| a.id().to_string())
        .collect();

    let strengths: Vec<Option<f64>> =
        framework.arguments().iter().map(|a| a.computed_strength()).collect();
    let strength_check = if strengths.iter().all(Option::is_none) {
        InvariantCheck::new(
            InvariantName::ValidComputedStrengths,
            true,
            Some("No computed strengths".into()),
        )
    } else {
        let bad: Vec<String> = framework
            .arguments()
            .iter()
            .filter(|a| !a.computed_strength().is_some_and(|s| (0.0..=1.0).contains(&s)))
            .map(|a| a.id().to_string())
            .collect();
        InvariantCheck::new(
            InvariantName::ValidComputedStrengths,
            bad.is_empty(),
            (!bad.is_empty()).then(|| format!("Missing or out of range: {}", bad.join(", "))),
        )
    };

    let disconnected: Vec<String> = framework
        .disconnected_arguments()
        .into_iter()
        .map(ToString::to_string)
        .collect();

    vec![
        InvariantCheck::new(InvariantName::Acyclic, framework.is_acyclic(), None),
        InvariantCheck::new(
            InvariantName::Connected,
            disconnected.is_empty(),
            (!disconnected.is_empty())
                .then(|| format!("Disconnected: {}", disconnected.join(", "))),
        ),
        InvariantCheck::new(InvariantName::TreeStructure, framework.is_tree_structure(), None),
        InvariantCheck::new(
            InvariantName::ValidBaseScores,
            bad_scores.is_empty(),
            (!bad_scores.is_empty()).then(|| format!("Out of range: {}", bad_scores.join(", "))),
        ),
        strength_check,
    ]
}

/// Framework invariants plus the trace-level ones: every cited source is in
/// the trace, uncertainty is stated, and re-evaluation reproduces the stored
/// strengths bit-for-bit with intact integrity hashes.
pub fn validate_trace_invariants(trace: &AuditTrace) -> Vec<InvariantCheck> {
    let mut checks = validate_invariants(trace.framework());

    let known: BTreeSet<_> = trace.sources().iter().map(|s| s.id()).collect();
    let dangling: BTreeSet<String> = trace
        .framework()
        .framework()
        .arguments()
        .iter()
        .flat_map(|a| a.source_refs())
        .filter(|id| !known.contains(id))
        .map(ToString::to_string)
        .collect();
    checks.push(InvariantCheck::new(
        InvariantName::SourcesReferenced,
        dangling.is_empty(),
        (!dangling.is_empty()).then(|| {
            format!(
                "Unknown sources: {}",
                dangling.into_iter().collect::<Vec<_>>().join(", ")
            )
        }),
    ));

    checks.push(InvariantCheck::new(
        InvariantName::UncertaintyPresent,
        !trace.uncertainty().confidence_statement().trim().is_empty(),
        None,
    ));

    checks.push(determinism_check(trace));
    checks
}

fn determinism_check(trace: &AuditTrace) -> InvariantCheck {
    let stored = trace.framework();
    let replay = match DfQuad.evaluate_at(stored.framework(), stored.evaluated_at()) {
        Ok(replay) => replay,
        Err(err) => {
            return InvariantCheck::new(InvariantName::Deterministic, false, Some(err.to_string()))
        }
    };
    let drifted: Vec<String> = stored
        .strengths()
        .into_iter()
        .filter(|(id, s)| replay.strength(id).map(f64::to_bits) != Some(s.to_bits()))
        .map(|(id, _)| id.to_string())
        .collect();
    if !drifted.is_empty() {
        return InvariantCheck::new(
            InvariantName::Deterministic,
            false,
            Some(format!("Strengths differ on replay: {}", drifted.join(", "))),
        );
    }

    match trace.verify_integrity() {
        Ok(report) if report.valid => InvariantCheck::new(InvariantName::Deterministic, true, None),
        Ok(report) => InvariantCheck::new(
            InvariantName::Deterministic,
            false,
            Some(format!("Integrity mismatch: {}", report.mismatches.join(", "))),
        ),
        Err(err) => InvariantCheck::new(InvariantName::Deterministic, false, Some(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{Argument, Relation};

    #[test]
    fn test_raw_framework_passes_strength_check() {
        let fw = ArgumentationFramework::new(
            "r",
            vec![Argument::new("r", "r", 0.5).unwrap(), Argument::new("a", "a", 0.5).unwrap()],
            vec![Relation::attack("rel-1", "a", "r")],
        )
        .unwrap();
        let checks = validate_invariants(&fw);
        assert_eq!(checks.len(), 5);
        assert!(all_passed(&checks));
        let strengths = checks
            .iter()
            .find(|c| c.invariant == InvariantName::ValidComputedStrengths)
            .unwrap();
        assert_eq!(strengths.details.as_deref(), Some("No computed strengths"));
    }

    #[test]
    fn test_partial_strengths_fail() {
        let fw = ArgumentationFramework::new(
            "r",
            vec![
                Argument::new("r", "r", 0.5).unwrap().with_computed_strength(0.5).unwrap(),
                Argument::new("a", "a", 0.5).unwrap(),
            ],
            vec![Relation::attack("rel-1", "a", "r")],
        )
        .unwrap();
        let checks = validate_invariants(&fw);
        assert!(!all_passed(&checks));
    }

    #[test]
    fn test_disconnected_reports_ids() {
        let fw = ArgumentationFramework::new(
            "r",
            vec![Argument::new("r", "r", 0.5).unwrap(), Argument::new("x", "x", 0.5).unwrap()],
            vec![],
        )
        .unwrap();
        let checks = validate_invariants(&fw);
        let connected = checks.iter().find(|c| c.invariant == InvariantName::Connected).unwrap();
        assert!(!connected.passed);
        assert_eq!(connected.details.as_deref(), Some("Disconnected: x"));
    }
}
