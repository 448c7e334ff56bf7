//! Contestations: typed proposals to change a framework
//!
//! ```text
//!   framework ──apply──▶ framework'          (pure, canonical id order)
//!       │                    │
//!       │ predict            │ evaluate
//!       ▼                    ▼
//!   will_increase/...    evaluated' ──diff──▶ RecomputeMetadata
//! ```
//!
//! `predict` is cheap: it uses the pro/con role of the touched argument and
//! never evaluates. `recompute` applies, re-evaluates and diffs against the
//! prior evaluation.
//!
//! `assumption_challenge` and `source_challenge` are accepted on the wire but
//! refused by apply/recompute with [`ContestationError::Unsupported`].

mod apply;
mod predict;
mod recompute;
mod validate;

pub use apply::apply_contestation;
pub use predict::{are_effects_compatible, predict_contestation_effect, ContestationEffect};
pub use recompute::{
    recompute_framework, recompute_framework_with, RecomputeMetadata, RecomputeOptions,
    RecomputeResult, RecomputeTrigger,
};
pub use validate::validate_contestation;

use crate::argument::{Argument, Relation};
use crate::error::{check_unit_interval, ModelError};
use crate::framework::FrameworkError;
use crate::ids::{ArgumentId, ContestationId, RelationId, SourceId};
use crate::semantics::SemanticsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContestationError {
    #[error("argument {0} not found")]
    ArgumentNotFound(ArgumentId),

    #[error("relation {0} not found")]
    RelationNotFound(RelationId),

    #[error("root argument {0} cannot be removed")]
    RootNotRemovable(ArgumentId),

    #[error("id {0} already exists in the framework")]
    IdCollision(String),

    #[error("new argument {0} must not carry a computed strength")]
    ComputedStrengthPresent(ArgumentId),

    #[error("new relation {relation} must originate from new argument {argument}")]
    RelationSourceMismatch {
        relation: RelationId,
        argument: ArgumentId,
    },

    #[error("{0} contestations are not supported")]
    Unsupported(&'static str),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Framework(#[from] FrameworkError),

    #[error(transparent)]
    Semantics(#[from] SemanticsError),
}

/// Type-specific payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ContestationKind {
    BaseScoreModification {
        target_argument_id: ArgumentId,
        new_base_score: f64,
    },
    ArgumentAddition {
        new_argument: Argument,
        new_relation: Relation,
    },
    ArgumentRemoval {
        target_argument_id: ArgumentId,
    },
    RelationAddition {
        new_relation: Relation,
    },
    RelationRemoval {
        target_relation_id: RelationId,
    },
    AssumptionChallenge {
        target_argument_id: ArgumentId,
        target_assumption_id: String,
    },
    SourceChallenge {
        target_source_id: SourceId,
    },
}

impl ContestationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContestationKind::BaseScoreModification { .. } => "base_score_modification",
            ContestationKind::ArgumentAddition { .. } => "argument_addition",
            ContestationKind::ArgumentRemoval { .. } => "argument_removal",
            ContestationKind::RelationAddition { .. } => "relation_addition",
            ContestationKind::RelationRemoval { .. } => "relation_removal",
            ContestationKind::AssumptionChallenge { .. } => "assumption_challenge",
            ContestationKind::SourceChallenge { .. } => "source_challenge",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            ContestationKind::AssumptionChallenge { .. } | ContestationKind::SourceChallenge { .. }
        )
    }

    /// The argument this contestation names directly, if any.
    pub fn direct_argument(&self) -> Option<&ArgumentId> {
        match self {
            ContestationKind::BaseScoreModification { target_argument_id, .. }
            | ContestationKind::ArgumentRemoval { target_argument_id }
            | ContestationKind::AssumptionChallenge { target_argument_id, .. } => {
                Some(target_argument_id)
            }
            ContestationKind::ArgumentAddition { new_argument, .. } => Some(new_argument.id()),
            ContestationKind::RelationAddition { .. }
            | ContestationKind::RelationRemoval { .. }
            | ContestationKind::SourceChallenge { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contestation {
    id: ContestationId,
    challenge: String,
    submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submitted_by: Option<String>,
    #[serde(flatten)]
    kind: ContestationKind,
}

impl Contestation {
    pub fn new(kind: ContestationKind, challenge: impl Into<String>) -> Self {
        Self {
            id: ContestationId::generate(),
            challenge: challenge.into(),
            submitted_at: Utc::now(),
            submitted_by: None,
            kind,
        }
    }

    pub fn base_score_modification(
        target: impl Into<ArgumentId>,
        new_base_score: f64,
        challenge: impl Into<String>,
    ) -> Result<Self, ContestationError> {
        let new_base_score = check_unit_interval("newBaseScore", new_base_score)?;
        Ok(Self::new(
            ContestationKind::BaseScoreModification {
                target_argument_id: target.into(),
                new_base_score,
            },
            challenge,
        ))
    }

    pub fn argument_addition(
        new_argument: Argument,
        new_relation: Relation,
        challenge: impl Into<String>,
    ) -> Result<Self, ContestationError> {
        if new_argument.computed_strength().is_some() {
            return Err(ContestationError::ComputedStrengthPresent(new_argument.id().clone()));
        }
        if &new_relation.from != new_argument.id() {
            return Err(ContestationError::RelationSourceMismatch {
                relation: new_relation.id,
                argument: new_argument.id().clone(),
            });
        }
        Ok(Self::new(
            ContestationKind::ArgumentAddition {
                new_argument,
                new_relation,
            },
            challenge,
        ))
    }

    pub fn argument_removal(target: impl Into<ArgumentId>, challenge: impl Into<String>) -> Self {
        Self::new(
            ContestationKind::ArgumentRemoval {
                target_argument_id: target.into(),
            },
            challenge,
        )
    }

    pub fn relation_addition(new_relation: Relation, challenge: impl Into<String>) -> Self {
        Self::new(ContestationKind::RelationAddition { new_relation }, challenge)
    }

    pub fn relation_removal(target: impl Into<RelationId>, challenge: impl Into<String>) -> Self {
        Self::new(
            ContestationKind::RelationRemoval {
                target_relation_id: target.into(),
            },
            challenge,
        )
    }

    pub fn with_id(mut self, id: impl Into<ContestationId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_submitted_at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = submitted_at;
        self
    }

    pub fn with_submitted_by(mut self, submitted_by: impl Into<String>) -> Self {
        self.submitted_by = Some(submitted_by.into());
        self
    }

    pub fn id(&self) -> &ContestationId {
        &self.id
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn submitted_by(&self) -> Option<&str> {
        self.submitted_by.as_deref()
    }

    pub fn kind(&self) -> &ContestationKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format_is_flat_and_tagged() {
        let c = Contestation::base_score_modification("arg-b2", 0.9, "weight too low")
            .unwrap()
            .with_id("contest-1")
            .with_submitted_by("reviewer-7");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "base_score_modification");
        assert_eq!(json["targetArgumentId"], "arg-b2");
        assert_eq!(json["newBaseScore"], 0.9);
        assert_eq!(json["submittedBy"], "reviewer-7");

        let back: Contestation = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_reserved_kinds_parse() {
        let json = json!({
            "id": "contest-2",
            "type": "source_challenge",
            "challenge": "stale source",
            "submittedAt": "2024-01-01T00:00:00Z",
            "targetSourceId": "src-1111"
        });
        let c: Contestation = serde_json::from_value(json).unwrap();
        assert_eq!(c.type_name(), "source_challenge");
        assert!(!c.kind().is_supported());
        assert_eq!(c.submitted_by(), None);
    }

    #[test]
    fn test_constructor_checks() {
        assert!(Contestation::base_score_modification("arg-1", 1.5, "x").is_err());

        let new_arg = Argument::new("arg-new", "new", 0.5).unwrap();
        let wrong = Relation::attack("rel-9", "arg-other", "arg-a1");
        assert!(matches!(
            Contestation::argument_addition(new_arg.clone(), wrong, "x"),
            Err(ContestationError::RelationSourceMismatch { .. })
        ));

        let evaluated = new_arg.with_computed_strength(0.5).unwrap();
        let rel = Relation::attack("rel-9", "arg-new", "arg-a1");
        assert!(matches!(
            Contestation::argument_addition(evaluated, rel, "x"),
            Err(ContestationError::ComputedStrengthPresent(_))
        ));
    }

    #[test]
    fn test_direct_argument() {
        let removal = Contestation::argument_removal("arg-c3", "x");
        assert_eq!(removal.kind().direct_argument().map(ArgumentId::as_str), Some("arg-c3"));
        let rel = Contestation::relation_removal("rel-1", "x");
        assert_eq!(rel.kind().direct_argument(), None);
    }
}
