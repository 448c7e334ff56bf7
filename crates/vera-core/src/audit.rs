//! Sealed audit traces
//!
//! ```text
//!   AuditTraceInput ──seal──▶ AuditTrace { body, integrity }
//!                                 │
//!                                 ├─ verify_integrity ─▶ IntegrityReport
//!                                 └─ contest(c) ───────▶ AuditTrace' (priorTraceId = traceId)
//! ```
//!
//! Every integrity hash is `hash(canonical(subject))`. The trace hash covers
//! every field except `integrity` itself, so any edit to a stored trace is
//! visible to `verify_integrity`.

use crate::claim::Claim;
use crate::contestation::{
    recompute_framework_with, Contestation, ContestationError, RecomputeMetadata, RecomputeOptions,
};
use crate::decision::{Decision, DecisionPolicy, DEFAULT_RECOMPUTE_HALF_WIDTH};
use crate::error::ModelError;
use crate::framework::{ArgumentationFramework, EvaluatedFramework, FrameworkError};
use crate::ids::{SourceId, TraceId};
use crate::semantics::{DfQuad, GradualSemantics, SemanticsError};
use crate::source::Source;
use crate::uncertainty::Uncertainty;
use crate::validation::validate_framework;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{info, warn};
use vera_integrity::{hash, sorted_by_key, verify_hash, IntegrityError};

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Framework validation failed: {0}")]
    FrameworkInvalid(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Framework(#[from] FrameworkError),

    #[error(transparent)]
    Semantics(#[from] SemanticsError),

    #[error(transparent)]
    Contestation(#[from] ContestationError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

// ============================================================================
// Trace Parts
// ============================================================================

/// Known limits of the analysis, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limitations {
    pub scope_limitations: Vec<String>,
    pub temporal_limitations: Vec<String>,
    pub source_limitations: Vec<String>,
    pub method_limitations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    RequiresChanges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanReview {
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_actions: Option<Vec<String>>,
}

impl HumanReview {
    pub fn pending() -> Self {
        Self {
            status: ReviewStatus::Pending,
            reviewer_id: None,
            reviewed_at: None,
            comments: None,
            required_actions: None,
        }
    }
}

/// Content hashes sealing a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityFields {
    pub claim_hash: String,
    pub framework_hash: String,
    pub sources_hash: String,
    pub uncertainty_hash: String,
    pub trace_hash: String,
}

/// Outcome of re-hashing a trace. `mismatches` names the integrity fields
/// (camelCase) whose stored value no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub valid: bool,
    pub mismatches: Vec<String>,
}

/// A framework handed to `seal`: already evaluated, or evaluated on the way in.
///
/// On the wire the evaluated form is recognised by `semanticsUsed` and
/// `evaluatedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameworkInput {
    Evaluated(EvaluatedFramework),
    Raw(ArgumentationFramework),
}

impl From<EvaluatedFramework> for FrameworkInput {
    fn from(framework: EvaluatedFramework) -> Self {
        FrameworkInput::Evaluated(framework)
    }
}

impl From<ArgumentationFramework> for FrameworkInput {
    fn from(framework: ArgumentationFramework) -> Self {
        FrameworkInput::Raw(framework)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTraceInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub claim: Claim,
    pub framework: FrameworkInput,
    pub sources: Vec<Source>,
    /// Derived from the root strength under the sealing policy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    pub uncertainty: Uncertainty,
    #[serde(default)]
    pub limitations: Limitations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contestation: Option<Contestation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recompute_metadata: Option<RecomputeMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_review: Option<HumanReview>,
}

impl AuditTraceInput {
    pub fn new(
        version: impl Into<String>,
        claim: Claim,
        framework: impl Into<FrameworkInput>,
        sources: Vec<Source>,
        uncertainty: Uncertainty,
    ) -> Self {
        Self {
            trace_id: None,
            version: version.into(),
            created_at: None,
            claim,
            framework: framework.into(),
            sources,
            decision: None,
            uncertainty,
            limitations: Limitations::default(),
            contestation: None,
            recompute_metadata: None,
            human_review: None,
        }
    }
}

/// Options for [`AuditTrace::contest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContestOptions {
    pub trace_id: Option<TraceId>,
    pub created_at: Option<DateTime<Utc>>,
    /// Indeterminate band for the new trace's decision
    pub decision_half_width: f64,
    /// Indeterminate band for `decisionChanged`
    pub change_half_width: f64,
}

impl Default for ContestOptions {
    fn default() -> Self {
        Self {
            trace_id: None,
            created_at: None,
            decision_half_width: 0.0,
            change_half_width: DEFAULT_RECOMPUTE_HALF_WIDTH,
        }
    }
}

// ============================================================================
// Audit Trace
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceBody {
    trace_id: TraceId,
    version: String,
    created_at: DateTime<Utc>,
    claim: Claim,
    framework: EvaluatedFramework,
    sources: Vec<Source>,
    unused_source_ids: Vec<SourceId>,
    decision: Decision,
    uncertainty: Uncertainty,
    limitations: Limitations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contestation: Option<Contestation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recompute_metadata: Option<RecomputeMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    human_review: Option<HumanReview>,
}

impl TraceBody {
    fn integrity(&self) -> Result<IntegrityFields, IntegrityError> {
        Ok(IntegrityFields {
            claim_hash: hash(&self.claim)?,
            framework_hash: hash(&self.framework)?,
            sources_hash: hash(&self.sources)?,
            uncertainty_hash: hash(&self.uncertainty)?,
            trace_hash: hash(self)?,
        })
    }
}

/// The sealed, self-verifying record of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrace {
    #[serde(flatten)]
    body: TraceBody,
    integrity: IntegrityFields,
}

impl AuditTrace {
    /// Seal with the default two-way decision policy.
    pub fn seal(input: AuditTraceInput) -> Result<Self, AuditError> {
        Self::seal_with(input, &DecisionPolicy::default())
    }

    /// Evaluate if needed, validate, and seal. `policy` only matters when the
    /// input carries no decision.
    pub fn seal_with(input: AuditTraceInput, policy: &DecisionPolicy) -> Result<Self, AuditError> {
        if input.version.trim().is_empty() {
            return Err(AuditError::MissingField("version"));
        }
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        let framework = match input.framework {
            FrameworkInput::Evaluated(evaluated) => evaluated,
            FrameworkInput::Raw(raw) => DfQuad.evaluate_at(&raw, created_at)?,
        };

        let report = validate_framework(&framework);
        if !report.valid {
            return Err(AuditError::FrameworkInvalid(report.summary()));
        }

        let decision = match input.decision {
            Some(decision) => decision,
            None => Decision::from_strength(
                framework.final_strength(),
                input.claim.statement(),
                policy,
            )?,
        };
        if decision.final_strength().to_bits() != framework.final_strength().to_bits() {
            warn!(
                decision = decision.final_strength(),
                framework = framework.final_strength(),
                "decision strength differs from the evaluated root strength"
            );
        }

        let sources = sorted_by_key(input.sources, |s| s.id().clone());
        let cited: BTreeSet<&SourceId> = framework
            .framework()
            .arguments()
            .iter()
            .flat_map(|a| a.source_refs())
            .collect();
        let unused_source_ids: Vec<SourceId> = sources
            .iter()
            .map(Source::id)
            .filter(|id| !cited.contains(id))
            .cloned()
            .collect();

        let body = TraceBody {
            trace_id: input.trace_id.unwrap_or_else(TraceId::generate),
            version: input.version,
            created_at,
            claim: input.claim,
            framework,
            sources,
            unused_source_ids,
            decision,
            uncertainty: input.uncertainty,
            limitations: input.limitations,
            contestation: input.contestation,
            recompute_metadata: input.recompute_metadata,
            human_review: input.human_review,
        };
        let integrity = body.integrity()?;

        info!(
            trace_id = %body.trace_id,
            trace_hash = %integrity.trace_hash,
            decision = %body.decision.label(),
            "sealed audit trace"
        );
        Ok(Self { body, integrity })
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.body.trace_id
    }

    pub fn version(&self) -> &str {
        &self.body.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.body.created_at
    }

    pub fn claim(&self) -> &Claim {
        &self.body.claim
    }

    pub fn framework(&self) -> &EvaluatedFramework {
        &self.body.framework
    }

    /// Sorted by id.
    pub fn sources(&self) -> &[Source] {
        &self.body.sources
    }

    pub fn unused_source_ids(&self) -> &[SourceId] {
        &self.body.unused_source_ids
    }

    pub fn decision(&self) -> &Decision {
        &self.body.decision
    }

    pub fn uncertainty(&self) -> &Uncertainty {
        &self.body.uncertainty
    }

    pub fn limitations(&self) -> &Limitations {
        &self.body.limitations
    }

    pub fn contestation(&self) -> Option<&Contestation> {
        self.body.contestation.as_ref()
    }

    pub fn recompute_metadata(&self) -> Option<&RecomputeMetadata> {
        self.body.recompute_metadata.as_ref()
    }

    pub fn human_review(&self) -> Option<&HumanReview> {
        self.body.human_review.as_ref()
    }

    pub fn integrity(&self) -> &IntegrityFields {
        &self.integrity
    }

    /// Recompute every hash and compare with the stored integrity fields.
    pub fn verify_integrity(&self) -> Result<IntegrityReport, IntegrityError> {
        let body = &self.body;
        let stored = &self.integrity;
        let checks = [
            ("claimHash", verify_hash(&body.claim, &stored.claim_hash)?),
            ("frameworkHash", verify_hash(&body.framework, &stored.framework_hash)?),
            ("sourcesHash", verify_hash(&body.sources, &stored.sources_hash)?),
            ("uncertaintyHash", verify_hash(&body.uncertainty, &stored.uncertainty_hash)?),
            ("traceHash", verify_hash(body, &stored.trace_hash)?),
        ];
        let mismatches: Vec<String> = checks
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(field, _)| (*field).to_string())
            .collect();
        if !mismatches.is_empty() {
            warn!(
                trace_id = %body.trace_id,
                mismatches = %mismatches.join(", "),
                "integrity mismatch"
            );
        }
        Ok(IntegrityReport {
            valid: mismatches.is_empty(),
            mismatches,
        })
    }

    /// Apply `contestation` to this trace's framework and seal the result as a
    /// new trace linked back to this one.
    ///
    /// The prior decision's threshold is kept. The new decision uses
    /// `options.decision_half_width`; `decisionChanged` is judged with
    /// `options.change_half_width`.
    pub fn contest(
        &self,
        contestation: &Contestation,
        options: &ContestOptions,
    ) -> Result<AuditTrace, AuditError> {
        let threshold = self.body.decision.threshold();
        let change_policy = DecisionPolicy::three_way(threshold, options.change_half_width);
        let decision_policy = DecisionPolicy::three_way(threshold, options.decision_half_width);
        let created_at = options.created_at.unwrap_or_else(Utc::now);

        let result = recompute_framework_with(
            self.body.framework.framework(),
            &self.body.framework,
            contestation,
            &RecomputeOptions {
                policy: change_policy,
                prior_trace_id: Some(self.body.trace_id.clone()),
                recomputed_at: Some(created_at),
            },
        )?;

        let decision = Decision::from_strength(
            result.evaluated.final_strength(),
            self.body.claim.statement(),
            &decision_policy,
        )?;

        Self::seal_with(
            AuditTraceInput {
                trace_id: options.trace_id.clone(),
                version: self.body.version.clone(),
                created_at: Some(created_at),
                claim: self.body.claim.clone(),
                framework: FrameworkInput::Evaluated(result.evaluated),
                sources: self.body.sources.clone(),
                decision: Some(decision),
                uncertainty: self.body.uncertainty.clone(),
                limitations: self.body.limitations.clone(),
                contestation: Some(contestation.clone()),
                recompute_metadata: Some(result.metadata),
                human_review: None,
            },
            &decision_policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{Argument, Relation};
    use crate::decision::DecisionLabel;
    use crate::toy_case::{toy_claim, toy_sources, toy_trace, toy_trace_input};
    use serde_json::Value;

    #[test]
    fn test_seal_toy_case() {
        let trace = toy_trace(false).unwrap();
        assert_eq!(trace.trace_id().as_str(), "trace-0000aaaa");
        let ids: Vec<&str> = trace.sources().iter().map(|s| s.id().as_str()).collect();
        assert_eq!(ids, vec!["src-1111", "src-2222"]);
        assert!(trace.unused_source_ids().is_empty());
        assert!(trace.verify_integrity().unwrap().valid);
    }

    #[test]
    fn test_source_order_does_not_change_hashes() {
        let forward = toy_trace(false).unwrap();
        let reversed = toy_trace(true).unwrap();
        assert_eq!(forward.integrity(), reversed.integrity());
    }

    #[test]
    fn test_unused_sources_listed() {
        let mut input = toy_trace_input(false).unwrap();
        let extra = Source::from_content(
            "Unused memo",
            "Never cited.",
            b"unused",
            crate::source::SourceMetadata::new(crate::source::SourceType::Document),
        )
        .unwrap()
        .with_id("src-0000");
        input.sources.push(extra);
        let trace = AuditTrace::seal(input).unwrap();
        assert_eq!(trace.unused_source_ids(), &[SourceId::from("src-0000")]);
        assert_eq!(trace.sources()[0].id().as_str(), "src-0000");
    }

    #[test]
    fn test_seal_rejects_invalid_framework() {
        let fw = ArgumentationFramework::new(
            "root",
            vec![
                Argument::new("root", "root", 0.5).unwrap(),
                Argument::new("a", "a", 0.5).unwrap(),
                Argument::new("b", "b", 0.5).unwrap(),
            ],
            vec![
                Relation::support("rel-1", "a", "root"),
                Relation::attack("rel-2", "a", "root"),
            ],
        )
        .unwrap();
        let input = AuditTraceInput::new(
            "0.1.0",
            toy_claim().unwrap(),
            fw,
            toy_sources().unwrap(),
            Uncertainty::minimal("low").unwrap(),
        );
        let err = AuditTrace::seal(input).unwrap_err().to_string();
        assert!(err.starts_with("Framework validation failed: "), "{err}");
        assert!(err.contains("INVALID_TREE_DEGREE"), "{err}");
        assert!(err.contains("FRAMEWORK_DISCONNECTED"), "{err}");
        assert!(err.contains("; "), "{err}");
    }

    #[test]
    fn test_seal_requires_version() {
        let mut input = toy_trace_input(false).unwrap();
        input.version = "  ".into();
        assert!(matches!(AuditTrace::seal(input), Err(AuditError::MissingField("version"))));
    }

    #[test]
    fn test_tampering_detected_after_round_trip() {
        let trace = toy_trace(false).unwrap();
        let mut json = serde_json::to_value(&trace).unwrap();
        json["claim"]["statement"] = Value::String("The system should deny the request.".into());
        let tampered: AuditTrace = serde_json::from_value(json).unwrap();
        let report = tampered.verify_integrity().unwrap();
        assert!(!report.valid);
        assert_eq!(report.mismatches, vec!["claimHash", "traceHash"]);

        let mut json = serde_json::to_value(&trace).unwrap();
        json["limitations"]["scopeLimitations"] = serde_json::json!([]);
        let tampered: AuditTrace = serde_json::from_value(json).unwrap();
        assert_eq!(tampered.verify_integrity().unwrap().mismatches, vec!["traceHash"]);
    }

    #[test]
    fn test_round_trip_preserves_integrity() {
        let trace = toy_trace(false).unwrap();
        let text = serde_json::to_string_pretty(&trace).unwrap();
        let back: AuditTrace = serde_json::from_str(&text).unwrap();
        assert_eq!(back, trace);
        assert!(back.verify_integrity().unwrap().valid);
    }

    #[test]
    fn test_contest_links_prior_trace() {
        let trace = toy_trace(false).unwrap();
        let c = Contestation::argument_removal("arg-c3", "policy does not apply");
        let next = trace
            .contest(
                &c,
                &ContestOptions {
                    trace_id: Some("trace-0000bbbb".into()),
                    ..ContestOptions::default()
                },
            )
            .unwrap();

        let meta = next.recompute_metadata().unwrap();
        assert_eq!(meta.prior_trace_id.as_ref(), Some(trace.trace_id()));
        assert_eq!(next.contestation(), Some(&c));
        assert!(meta.strength_delta > 0.0);
        assert_eq!(next.decision().threshold(), trace.decision().threshold());
        assert_eq!(next.decision().label(), DecisionLabel::Supported);
        assert!(next.human_review().is_none());
        assert!(next.verify_integrity().unwrap().valid);
        assert_ne!(next.integrity().trace_hash, trace.integrity().trace_hash);
    }

    #[test]
    fn test_contest_refuses_root_removal() {
        let trace = toy_trace(false).unwrap();
        let c = Contestation::argument_removal("arg-a1", "x");
        assert!(matches!(
            trace.contest(&c, &ContestOptions::default()),
            Err(AuditError::Contestation(ContestationError::RootNotRemovable(_)))
        ));
    }
}
