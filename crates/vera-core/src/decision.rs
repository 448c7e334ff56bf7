//! Decision labels derived from the root's computed strength.
//!
//! One labeling function covers both two-way and three-way labeling:
//!
//! ```text
//!   0 ─────────── t-w ═══════ t ═══════ t+w ─────────── 1
//!     contested        indeterminate          supported
//! ```
//!
//! With `w = 0` the band collapses and `s <= t` is contested.

use crate::error::{check_non_empty, check_unit_interval, ModelError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Half-width of the indeterminate band used when detecting decision changes
/// on recompute.
pub const DEFAULT_RECOMPUTE_HALF_WIDTH: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionLabel {
    Supported,
    Contested,
    Indeterminate,
}

impl DecisionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionLabel::Supported => "supported",
            DecisionLabel::Contested => "contested",
            DecisionLabel::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold plus optional indeterminate band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecisionPolicy {
    /// Center of the decision boundary
    pub threshold: f64,
    /// Half-width of the indeterminate band around `threshold`; 0 gives two-way labeling
    pub indeterminate_half_width: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::two_way(DEFAULT_THRESHOLD)
    }
}

impl DecisionPolicy {
    pub fn two_way(threshold: f64) -> Self {
        Self {
            threshold,
            indeterminate_half_width: 0.0,
        }
    }

    pub fn three_way(threshold: f64, indeterminate_half_width: f64) -> Self {
        Self {
            threshold,
            indeterminate_half_width,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        check_unit_interval("threshold", self.threshold)?;
        check_unit_interval("indeterminateHalfWidth", self.indeterminate_half_width)?;
        Ok(())
    }

    pub fn label(&self, strength: f64) -> DecisionLabel {
        let t = self.threshold;
        let w = self.indeterminate_half_width;
        if strength > t + w {
            DecisionLabel::Supported
        } else if w == 0.0 || strength < t - w {
            DecisionLabel::Contested
        } else {
            DecisionLabel::Indeterminate
        }
    }
}

/// The outcome recorded on an audit trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDecision")]
pub struct Decision {
    label: DecisionLabel,
    final_strength: f64,
    threshold: f64,
    conclusion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conditions: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
    label: DecisionLabel,
    final_strength: f64,
    threshold: f64,
    conclusion: String,
    #[serde(default)]
    conditions: Option<Vec<String>>,
}

impl TryFrom<RawDecision> for Decision {
    type Error = ModelError;

    fn try_from(raw: RawDecision) -> Result<Self, Self::Error> {
        let decision = Decision::new(raw.label, raw.final_strength, raw.threshold, raw.conclusion)?;
        Ok(match raw.conditions {
            Some(conditions) => decision.with_conditions(conditions),
            None => decision,
        })
    }
}

impl Decision {
    pub fn new(
        label: DecisionLabel,
        final_strength: f64,
        threshold: f64,
        conclusion: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let conclusion = conclusion.into();
        check_non_empty("conclusion", &conclusion)?;
        Ok(Self {
            label,
            final_strength: check_unit_interval("finalStrength", final_strength)?,
            threshold: check_unit_interval("threshold", threshold)?,
            conclusion,
            conditions: None,
        })
    }

    /// Label `final_strength` under `policy` and write the standard conclusion
    /// for `claim_statement`.
    pub fn from_strength(
        final_strength: f64,
        claim_statement: &str,
        policy: &DecisionPolicy,
    ) -> Result<Self, ModelError> {
        policy.validate()?;
        check_unit_interval("finalStrength", final_strength)?;
        let label = policy.label(final_strength);
        Self::new(
            label,
            final_strength,
            policy.threshold,
            conclusion_for(label, claim_statement),
        )
    }

    pub fn with_conditions(mut self, conditions: Vec<String>) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn label(&self) -> DecisionLabel {
        self.label
    }

    pub fn final_strength(&self) -> f64 {
        self.final_strength
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn conclusion(&self) -> &str {
        &self.conclusion
    }

    pub fn conditions(&self) -> Option<&[String]> {
        self.conditions.as_deref()
    }

    /// Distance of the final strength from the threshold.
    pub fn margin(&self) -> f64 {
        (self.final_strength - self.threshold).abs()
    }
}

fn conclusion_for(label: DecisionLabel, claim_statement: &str) -> String {
    match label {
        DecisionLabel::Supported => format!(
            "The claim \"{claim_statement}\" is supported by the argumentation framework."
        ),
        DecisionLabel::Contested => format!(
            "The claim \"{claim_statement}\" is contested by the argumentation framework."
        ),
        DecisionLabel::Indeterminate => format!(
            "The claim \"{claim_statement}\" has indeterminate support in the argumentation framework."
        ),
    }
}
