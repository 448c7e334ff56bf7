//! A small synthetic case used by the demo command and the tests.
//!
//! Four arguments, three relations, two mock sources. Every id and timestamp
//! is fixed so the sealed trace hashes identically on every run.

use crate::argument::{Argument, Relation};
use crate::audit::{AuditError, AuditTrace, AuditTraceInput, FrameworkInput, Limitations};
use crate::claim::Claim;
use crate::decision::{Decision, DecisionPolicy};
use crate::error::ModelError;
use crate::framework::{ArgumentationFramework, FrameworkError};
use crate::ids::SourceId;
use crate::semantics::{DfQuad, GradualSemantics};
use crate::source::{Source, SourceMetadata, SourceType};
use crate::uncertainty::Uncertainty;
use chrono::{DateTime, Utc};
use vera_integrity::hash;

pub const TOY_TRACE_ID: &str = "trace-0000aaaa";
pub const TOY_VERSION: &str = "0.1.0";

/// 2024-01-01T00:00:00Z
pub fn toy_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

pub fn toy_claim() -> Result<Claim, ModelError> {
    Ok(Claim::new("The system should approve the request.", "Synthetic example for Vera.")?
        .with_id("claim-aaaa1111")
        .with_created_at(toy_timestamp()))
}

pub fn toy_framework() -> Result<ArgumentationFramework, FrameworkError> {
    let policy = SourceId::from("src-1111");
    let guidance = SourceId::from("src-2222");
    let arguments = vec![
        Argument::new("arg-a1", "Approve the request.", 0.6)?
            .with_source_refs(vec![policy.clone()]),
        Argument::new("arg-b2", "Evidence supports approval.", 0.7)?.with_source_refs(vec![policy]),
        Argument::new("arg-c3", "Policy warns against approval.", 0.4)?
            .with_source_refs(vec![guidance.clone()]),
        Argument::new("arg-d4", "Exception applies to the policy.", 0.8)?
            .with_source_refs(vec![guidance]),
    ];
    let relations = vec![
        Relation::support("rel-1", "arg-b2", "arg-a1"),
        Relation::attack("rel-2", "arg-c3", "arg-a1"),
        Relation::support("rel-3", "arg-d4", "arg-c3"),
    ];
    ArgumentationFramework::new("arg-a1", arguments, relations)
}

fn mock_source(
    id: &str,
    title: &str,
    description: &str,
    content_key: &str,
    source_type: SourceType,
    tag: &str,
) -> Result<Source, AuditError> {
    let metadata = SourceMetadata {
        version: Some("1.0.0".into()),
        jurisdiction: Some("synthetic".into()),
        tags: vec!["toy".into(), tag.into()],
        ..SourceMetadata::new(source_type)
    };
    Ok(Source::new(title, description, hash(content_key)?, metadata)?
        .with_id(id)
        .with_retrieved_at(toy_timestamp()))
}

pub fn toy_sources() -> Result<Vec<Source>, AuditError> {
    Ok(vec![
        mock_source(
            "src-1111",
            "Mock policy excerpt",
            "Synthetic policy statement.",
            "policy-1",
            SourceType::Policy,
            "policy",
        )?,
        mock_source(
            "src-2222",
            "Mock guidance memo",
            "Synthetic guidance statement.",
            "guidance-1",
            SourceType::Guidance,
            "guidance",
        )?,
    ])
}

/// Seal-ready input. `reversed_sources` feeds the sources in reverse id
/// order, which must not change any hash.
pub fn toy_trace_input(reversed_sources: bool) -> Result<AuditTraceInput, AuditError> {
    let claim = toy_claim()?;
    let evaluated = DfQuad.evaluate_at(&toy_framework()?, toy_timestamp())?;
    let decision =
        Decision::from_strength(
            evaluated.final_strength(),
            claim.statement(),
            &DecisionPolicy::default(),
        )?;

    let mut sources = toy_sources()?;
    if reversed_sources {
        sources.reverse();
    }

    Ok(AuditTraceInput {
        trace_id: Some(TOY_TRACE_ID.into()),
        version: TOY_VERSION.into(),
        created_at: Some(toy_timestamp()),
        claim,
        framework: FrameworkInput::Evaluated(evaluated),
        sources,
        decision: Some(decision),
        uncertainty: Uncertainty::minimal("High confidence based on the synthetic evidence.")?,
        limitations: Limitations {
            scope_limitations: vec!["Synthetic toy case only.".into()],
            temporal_limitations: vec!["Static example.".into()],
            source_limitations: vec!["Mock sources only.".into()],
            method_limitations: vec!["DF-QuAD only.".into()],
        },
        contestation: None,
        recompute_metadata: None,
        human_review: None,
    })
}

pub fn toy_trace(reversed_sources: bool) -> Result<AuditTrace, AuditError> {
    AuditTrace::seal(toy_trace_input(reversed_sources)?)
}
