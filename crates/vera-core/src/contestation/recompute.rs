use super::{apply_contestation, Contestation, ContestationError};
use crate::decision::{DecisionPolicy, DEFAULT_RECOMPUTE_HALF_WIDTH, DEFAULT_THRESHOLD};
use crate::framework::{ArgumentationFramework, EvaluatedFramework};
use crate::ids::{ArgumentId, ContestationId, TraceId};
use crate::semantics::{DfQuad, GradualSemantics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use vera_integrity::sorted_unique;

/// What caused a recompute. Serialized as a bare string: the contestation id,
/// `source_update`, or `manual`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecomputeTrigger {
    Contestation(ContestationId),
    SourceUpdate,
    Manual,
}

impl RecomputeTrigger {
    pub fn as_str(&self) -> &str {
        match self {
            RecomputeTrigger::Contestation(id) => id.as_str(),
            RecomputeTrigger::SourceUpdate => "source_update",
            RecomputeTrigger::Manual => "manual",
        }
    }
}

impl From<String> for RecomputeTrigger {
    fn from(value: String) -> Self {
        match value.as_str() {
            "source_update" => RecomputeTrigger::SourceUpdate,
            "manual" => RecomputeTrigger::Manual,
            _ => RecomputeTrigger::Contestation(ContestationId::new(value)),
        }
    }
}

impl Serialize for RecomputeTrigger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecomputeTrigger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(RecomputeTrigger::from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeMetadata {
    /// Trace the recompute started from, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_trace_id: Option<TraceId>,
    pub triggered_by: RecomputeTrigger,
    /// Direct target plus every argument whose strength changed; sorted, unique
    pub changed_argument_ids: Vec<ArgumentId>,
    pub recomputed_at: DateTime<Utc>,
    /// New root strength minus old
    pub strength_delta: f64,
    pub decision_changed: bool,
    pub diff_summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeOptions {
    /// Policy used to label old and new root strengths
    pub policy: DecisionPolicy,
    pub prior_trace_id: Option<TraceId>,
    /// Fixed timestamp for reproducible output; `now` when unset
    pub recomputed_at: Option<DateTime<Utc>>,
}

impl Default for RecomputeOptions {
    fn default() -> Self {
        Self {
            policy: DecisionPolicy::three_way(DEFAULT_THRESHOLD, DEFAULT_RECOMPUTE_HALF_WIDTH),
            prior_trace_id: None,
            recomputed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeResult {
    pub framework: ArgumentationFramework,
    pub evaluated: EvaluatedFramework,
    pub metadata: RecomputeMetadata,
}

pub fn recompute_framework(
    original: &ArgumentationFramework,
    original_evaluated: &EvaluatedFramework,
    contestation: &Contestation,
) -> Result<RecomputeResult, ContestationError> {
    recompute_framework_with(
        original,
        original_evaluated,
        contestation,
        &RecomputeOptions::default(),
    )
}

/// Apply `contestation`, re-evaluate, and diff against `original_evaluated`.
pub fn recompute_framework_with(
    original: &ArgumentationFramework,
    original_evaluated: &EvaluatedFramework,
    contestation: &Contestation,
    options: &RecomputeOptions,
) -> Result<RecomputeResult, ContestationError> {
    options.policy.validate()?;
    let recomputed_at = options.recomputed_at.unwrap_or_else(Utc::now);

    let framework = apply_contestation(original, contestation)?;
    let evaluated = DfQuad.evaluate_at(&framework, recomputed_at)?;

    let mut changed: Vec<ArgumentId> =
        contestation.kind().direct_argument().cloned().into_iter().collect();
    changed.extend(
        evaluated
            .framework()
            .arguments()
            .iter()
            .filter(|arg| {
                matches!(
                    (original_evaluated.strength(arg.id()), arg.computed_strength()),
                    (Some(before), Some(after)) if before != after
                )
            })
            .map(|arg| arg.id().clone()),
    );
    let changed_argument_ids = sorted_unique(changed);

    let before = original_evaluated.final_strength();
    let after = evaluated.final_strength();
    let strength_delta = after - before;
    let decision_changed = options.policy.label(before) != options.policy.label(after);
    let diff_summary = format!(
        "Contestation applied: {}. Strength: {before:.3} -> {after:.3} ({strength_delta:+.3}). Decision {}.",
        contestation.type_name(),
        if decision_changed { "changed" } else { "unchanged" },
    );

    debug!(
        contestation = %contestation.id(),
        changed = changed_argument_ids.len(),
        strength_delta,
        decision_changed,
        "recomputed framework"
    );

    Ok(RecomputeResult {
        framework,
        evaluated,
        metadata: RecomputeMetadata {
            prior_trace_id: options.prior_trace_id.clone(),
            triggered_by: RecomputeTrigger::Contestation(contestation.id().clone()),
            changed_argument_ids,
            recomputed_at,
            strength_delta,
            decision_changed,
            diff_summary,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contestation::ContestationKind;
    use crate::toy_case::toy_framework;
    use approx::assert_relative_eq;

    fn evaluate(fw: &ArgumentationFramework) -> EvaluatedFramework {
        DfQuad.evaluate(fw).unwrap()
    }

    #[test]
    fn test_changed_ids_include_target_and_ancestors() {
        let fw = toy_framework().unwrap();
        let before = evaluate(&fw);
        let c = Contestation::base_score_modification("arg-d4", 0.2, "x").unwrap();
        let result = recompute_framework(&fw, &before, &c).unwrap();

        let ids: Vec<&str> = result
            .metadata
            .changed_argument_ids
            .iter()
            .map(ArgumentId::as_str)
            .collect();
        assert_eq!(ids, vec!["arg-a1", "arg-c3", "arg-d4"]);
        assert_eq!(result.metadata.triggered_by, RecomputeTrigger::Contestation(c.id().clone()));
        assert!(result.metadata.strength_delta > 0.0);
        assert_relative_eq!(
            result.metadata.strength_delta,
            result.evaluated.final_strength() - before.final_strength()
        );
    }

    #[test]
    fn test_result_framework_agrees_with_evaluation() {
        let before = evaluate(&toy_framework().unwrap());
        let c = Contestation::base_score_modification("arg-d4", 0.2, "x").unwrap();
        let result = recompute_framework(before.framework(), &before, &c).unwrap();

        assert!(result.framework.arguments().iter().all(|a| a.computed_strength().is_none()));
        let root = result.evaluated.framework().root();
        assert_eq!(root.computed_strength(), Some(result.evaluated.final_strength()));
        assert_relative_eq!(result.evaluated.final_strength(), 0.672, epsilon = 1e-12);
    }

    #[test]
    fn test_unchanged_strength_is_not_listed() {
        let fw = toy_framework().unwrap();
        let before = evaluate(&fw);
        let c = Contestation::base_score_modification("arg-b2", 0.7, "same").unwrap();
        let result = recompute_framework(&fw, &before, &c).unwrap();
        let ids: Vec<&str> = result
            .metadata
            .changed_argument_ids
            .iter()
            .map(ArgumentId::as_str)
            .collect();
        assert_eq!(ids, vec!["arg-b2"]);
        assert_eq!(result.metadata.strength_delta, 0.0);
        assert!(result.metadata.diff_summary.ends_with("(+0.000). Decision unchanged."));
    }

    #[test]
    fn test_diff_summary_format() {
        let fw = toy_framework().unwrap();
        let before = evaluate(&fw);
        let c = Contestation::argument_removal("arg-c3", "x");
        let result = recompute_framework(&fw, &before, &c).unwrap();
        let expected = format!(
            "Contestation applied: argument_removal. Strength: {:.3} -> {:.3} ({:+.3}). Decision {}.",
            before.final_strength(),
            result.evaluated.final_strength(),
            result.metadata.strength_delta,
            if result.metadata.decision_changed { "changed" } else { "unchanged" },
        );
        assert_eq!(result.metadata.diff_summary, expected);
        assert!(result
            .metadata
            .diff_summary
            .starts_with("Contestation applied: argument_removal."));
    }

    #[test]
    fn test_decision_change_uses_policy() {
        let fw = toy_framework().unwrap();
        let before = evaluate(&fw);
        let c = Contestation::argument_removal("arg-c3", "x");
        let flips = recompute_framework_with(
            &fw,
            &before,
            &c,
            &RecomputeOptions {
                policy: DecisionPolicy::two_way(before.final_strength()),
                ..RecomputeOptions::default()
            },
        )
        .unwrap();
        assert!(flips.metadata.decision_changed);

        let never = recompute_framework_with(
            &fw,
            &before,
            &c,
            &RecomputeOptions {
                policy: DecisionPolicy::two_way(1.0),
                ..RecomputeOptions::default()
            },
        )
        .unwrap();
        assert!(!never.metadata.decision_changed);
    }

    #[test]
    fn test_unsupported_refused() {
        let fw = toy_framework().unwrap();
        let before = evaluate(&fw);
        let c = Contestation::new(
            ContestationKind::SourceChallenge {
                target_source_id: "src-1111".into(),
            },
            "x",
        );
        assert_eq!(
            recompute_framework(&fw, &before, &c).unwrap_err(),
            ContestationError::Unsupported("source_challenge")
        );
    }

    #[test]
    fn test_trigger_string_form() {
        let json = serde_json::to_string(&RecomputeTrigger::SourceUpdate).unwrap();
        assert_eq!(json, "\"source_update\"");
        let back: RecomputeTrigger = serde_json::from_str("\"contest-42\"").unwrap();
        assert_eq!(back, RecomputeTrigger::Contestation(ContestationId::from("contest-42")));
    }
}
