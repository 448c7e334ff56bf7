//! Gradual semantics: propagate base scores into computed strengths.

pub mod dfquad;

pub use dfquad::{aggregate, combine, evaluate_with_dfquad, ArgumentEvaluation, DfQuad};

use crate::framework::{ArgumentationFramework, EvaluatedFramework, FrameworkError, SemanticsType};
use crate::ids::{ArgumentId, RelationId};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Evaluation-time failures. These mean the graph broke an invariant the
/// evaluator relies on, not that the caller sent a bad request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticsError {
    #[error("framework contains a cycle through {}", join(.remaining))]
    FrameworkCycle { remaining: Vec<ArgumentId> },

    #[error("no strength computed for {missing} while evaluating {argument}")]
    MissingStrength {
        argument: ArgumentId,
        missing: ArgumentId,
    },

    #[error("relation {relation} references unknown argument {endpoint}")]
    DanglingRelation {
        relation: RelationId,
        endpoint: ArgumentId,
    },

    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

fn join(ids: &[ArgumentId]) -> String {
    ids.iter().map(ArgumentId::as_str).collect::<Vec<_>>().join(", ")
}

pub trait GradualSemantics {
    fn semantics_type(&self) -> SemanticsType;

    /// Evaluate with an explicit timestamp, for reproducible output.
    fn evaluate_at(
        &self,
        framework: &ArgumentationFramework,
        evaluated_at: DateTime<Utc>,
    ) -> Result<EvaluatedFramework, SemanticsError>;

    fn evaluate(
        &self,
        framework: &ArgumentationFramework,
    ) -> Result<EvaluatedFramework, SemanticsError> {
        self.evaluate_at(framework, Utc::now())
    }
}
