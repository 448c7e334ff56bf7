//! Arguments and the attack/support relations between them.

use crate::error::{check_unit_interval, ModelError};
use crate::ids::{ArgumentId, RelationId, SourceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Assumptions
// ============================================================================

/// An unstated premise an argument relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumption {
    pub id: String,
    pub statement: String,
    pub basis: String,
    #[serde(default = "default_contestable")]
    pub is_contestable: bool,
}

fn default_contestable() -> bool {
    true
}

impl Assumption {
    pub fn new(statement: impl Into<String>, basis: impl Into<String>) -> Self {
        Self {
            id: format!("assumption-{}", Uuid::new_v4()),
            statement: statement.into(),
            basis: basis.into(),
            is_contestable: true,
        }
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// A node of the argumentation framework.
///
/// `base_score` is the intrinsic strength τ; `computed_strength` is σ and is
/// only present once a semantics has evaluated the framework. Both are checked
/// to lie in `[0, 1]` by every constructor and by deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawArgument")]
pub struct Argument {
    id: ArgumentId,
    content: String,
    base_score: f64,
    source_refs: Vec<SourceId>,
    assumptions: Vec<Assumption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    computed_strength: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArgument {
    id: ArgumentId,
    content: String,
    base_score: f64,
    #[serde(default)]
    source_refs: Vec<SourceId>,
    #[serde(default)]
    assumptions: Vec<Assumption>,
    #[serde(default)]
    computed_strength: Option<f64>,
}

impl TryFrom<RawArgument> for Argument {
    type Error = ModelError;

    fn try_from(raw: RawArgument) -> Result<Self, Self::Error> {
        let argument = Argument::new(raw.id, raw.content, raw.base_score)?
            .with_source_refs(raw.source_refs)
            .with_assumptions(raw.assumptions);
        match raw.computed_strength {
            Some(strength) => argument.with_computed_strength(strength),
            None => Ok(argument),
        }
    }
}

impl Argument {
    pub fn new(
        id: impl Into<ArgumentId>,
        content: impl Into<String>,
        base_score: f64,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            id: id.into(),
            content: content.into(),
            base_score: check_unit_interval("baseScore", base_score)?,
            source_refs: Vec::new(),
            assumptions: Vec::new(),
            computed_strength: None,
        })
    }

    pub fn with_source_refs(mut self, source_refs: Vec<SourceId>) -> Self {
        self.source_refs = source_refs;
        self
    }

    pub fn with_assumptions(mut self, assumptions: Vec<Assumption>) -> Self {
        self.assumptions = assumptions;
        self
    }

    /// Copy with a new base score. Any computed strength is dropped since it
    /// no longer reflects the score.
    pub fn with_base_score(&self, base_score: f64) -> Result<Self, ModelError> {
        Ok(Self {
            base_score: check_unit_interval("baseScore", base_score)?,
            computed_strength: None,
            ..self.clone()
        })
    }

    pub fn with_computed_strength(&self, strength: f64) -> Result<Self, ModelError> {
        Ok(Self {
            computed_strength: Some(check_unit_interval("computedStrength", strength)?),
            ..self.clone()
        })
    }

    pub fn without_computed_strength(&self) -> Self {
        Self {
            computed_strength: None,
            ..self.clone()
        }
    }

    pub fn id(&self) -> &ArgumentId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn source_refs(&self) -> &[SourceId] {
        &self.source_refs
    }

    pub fn assumptions(&self) -> &[Assumption] {
        &self.assumptions
    }

    pub fn computed_strength(&self) -> Option<f64> {
        self.computed_strength
    }
}

// ============================================================================
// Relations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Attack,
    Support,
}

/// Directed edge `from → to`: `from` attacks or supports `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub from: ArgumentId,
    pub to: ArgumentId,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

impl Relation {
    pub fn new(
        id: impl Into<RelationId>,
        from: impl Into<ArgumentId>,
        to: impl Into<ArgumentId>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            relation_type,
        }
    }

    pub fn attack(
        id: impl Into<RelationId>,
        from: impl Into<ArgumentId>,
        to: impl Into<ArgumentId>,
    ) -> Self {
        Self::new(id, from, to, RelationType::Attack)
    }

    pub fn support(
        id: impl Into<RelationId>,
        from: impl Into<ArgumentId>,
        to: impl Into<ArgumentId>,
    ) -> Self {
        Self::new(id, from, to, RelationType::Support)
    }

    pub fn is_attack(&self) -> bool {
        self.relation_type == RelationType::Attack
    }

    pub fn touches(&self, id: &ArgumentId) -> bool {
        &self.from == id || &self.to == id
    }
}
