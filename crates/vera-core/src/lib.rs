//! Vera: contestable, hash-sealed audit traces
//!
//! A claim is argued over as a tree-shaped quantitative bipolar
//! argumentation framework, evaluated with DF-QuAD, labeled with a decision
//! and sealed into an [`AuditTrace`] whose integrity hashes expose any later
//! edit. Anyone can then contest the reasoning: a [`Contestation`] proposes a
//! typed change, and recompute reports exactly which strengths moved and
//! whether the decision flipped.
//!
//! ## Module Organization
//!
//! - `claim`, `source`, `argument`, `uncertainty`, `decision`: entities
//! - `framework`: QBAF construction, index and structural queries
//! - `semantics`: `GradualSemantics` and DF-QuAD
//! - `validation`: framework validation and named invariants
//! - `contestation`: apply / validate / predict / recompute
//! - `audit`: sealing, verification, contesting a sealed trace
//! - `store`: in-memory and directory trace stores
//! - `config`: JSON-loadable policy knobs
//! - `toy_case`: a fixed synthetic case for demos and tests

pub mod argument;
pub mod audit;
pub mod claim;
pub mod config;
pub mod contestation;
pub mod decision;
pub mod error;
pub mod framework;
pub mod ids;
pub mod semantics;
pub mod source;
pub mod store;
pub mod toy_case;
pub mod uncertainty;
pub mod validation;

pub use argument::{Argument, Assumption, Relation, RelationType};
pub use audit::{
    AuditError, AuditTrace, AuditTraceInput, ContestOptions, FrameworkInput, HumanReview,
    IntegrityFields, IntegrityReport, Limitations, ReviewStatus,
};
pub use claim::Claim;
pub use config::{ConfigError, RecomputePolicy, VeraConfig};
pub use contestation::{
    apply_contestation, are_effects_compatible, predict_contestation_effect, recompute_framework,
    recompute_framework_with, validate_contestation, Contestation, ContestationEffect,
    ContestationError, ContestationKind, RecomputeMetadata, RecomputeOptions, RecomputeResult,
    RecomputeTrigger,
};
pub use decision::{Decision, DecisionLabel, DecisionPolicy};
pub use error::ModelError;
pub use framework::{
    ArgumentRole, ArgumentationFramework, EvaluatedFramework, FrameworkError, SemanticsType,
};
pub use ids::{ArgumentId, ClaimId, ContestationId, RelationId, SourceId, TraceId};
pub use semantics::{evaluate_with_dfquad, DfQuad, GradualSemantics, SemanticsError};
pub use source::{Source, SourceMetadata, SourceType};
pub use store::{DirectoryTraceStore, InMemoryTraceStore, StoreError, TraceStore};
pub use uncertainty::{RiskFlag, RiskSeverity, Uncertainty, Unknown};
pub use validation::{
    validate_framework, validate_invariants, validate_trace_invariants, InvariantCheck,
    InvariantName, Severity, ValidationCode, ValidationError, ValidationReport,
};
