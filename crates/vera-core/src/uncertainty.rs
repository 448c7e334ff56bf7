use crate::error::{check_non_empty, ModelError};
use crate::ids::ArgumentId;
use serde::{Deserialize, Serialize};

/// Risk severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Something the evaluation could not establish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unknown {
    pub id: String,
    pub description: String,
    pub impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_strategy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFlag {
    pub id: String,
    pub description: String,
    pub severity: RiskSeverity,
    #[serde(default)]
    pub related_argument_ids: Vec<ArgumentId>,
}

/// Uncertainty attached to every audit trace, even when both lists are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawUncertainty")]
pub struct Uncertainty {
    unknowns: Vec<Unknown>,
    risk_flags: Vec<RiskFlag>,
    confidence_statement: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUncertainty {
    #[serde(default)]
    unknowns: Vec<Unknown>,
    #[serde(default)]
    risk_flags: Vec<RiskFlag>,
    confidence_statement: String,
}

impl TryFrom<RawUncertainty> for Uncertainty {
    type Error = ModelError;

    fn try_from(raw: RawUncertainty) -> Result<Self, Self::Error> {
        let mut uncertainty = Uncertainty::minimal(raw.confidence_statement)?;
        uncertainty.unknowns = raw.unknowns;
        uncertainty.risk_flags = raw.risk_flags;
        Ok(uncertainty)
    }
}

impl Uncertainty {
    /// No unknowns, no risk flags, just the confidence statement.
    pub fn minimal(confidence_statement: impl Into<String>) -> Result<Self, ModelError> {
        let confidence_statement = confidence_statement.into();
        check_non_empty("confidenceStatement", &confidence_statement)?;
        Ok(Self {
            unknowns: Vec::new(),
            risk_flags: Vec::new(),
            confidence_statement,
        })
    }

    pub fn with_unknown(mut self, unknown: Unknown) -> Self {
        self.unknowns.push(unknown);
        self
    }

    pub fn with_risk_flag(mut self, flag: RiskFlag) -> Self {
        self.risk_flags.push(flag);
        self
    }

    pub fn unknowns(&self) -> &[Unknown] {
        &self.unknowns
    }

    pub fn risk_flags(&self) -> &[RiskFlag] {
        &self.risk_flags
    }

    pub fn confidence_statement(&self) -> &str {
        &self.confidence_statement
    }

    pub fn highest_severity(&self) -> Option<RiskSeverity> {
        self.risk_flags.iter().map(|f| f.severity).max()
    }

    /// True when any flag is `high` or `critical`.
    pub fn has_significant_risks(&self) -> bool {
        self.highest_severity() >= Some(RiskSeverity::High)
    }
}
