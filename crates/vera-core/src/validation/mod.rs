//! Structural validation.
//!
//! Validators never fail: they return every problem they find so a caller can
//! report them all at once.

mod framework;
mod invariants;

pub use framework::validate_framework;
pub use invariants::{
    all_passed, validate_invariants, validate_trace_invariants, InvariantCheck, InvariantName,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    // framework structure
    RootNotFound,
    DuplicateArgumentId,
    DuplicateRelationId,
    UnknownArgument,
    InvalidBaseScore,
    InvalidComputedStrength,
    InvalidTreeDegree,
    FrameworkCycle,
    FrameworkDisconnected,
    // contestation pre-flight
    TargetNotFound,
    RootNotRemovable,
    IdCollision,
    ComputedStrengthPresent,
    RelationSourceMismatch,
    UnsupportedContestation,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::RootNotFound => "ROOT_NOT_FOUND",
            ValidationCode::DuplicateArgumentId => "DUPLICATE_ARGUMENT_ID",
            ValidationCode::DuplicateRelationId => "DUPLICATE_RELATION_ID",
            ValidationCode::UnknownArgument => "UNKNOWN_ARGUMENT",
            ValidationCode::InvalidBaseScore => "INVALID_BASE_SCORE",
            ValidationCode::InvalidComputedStrength => "INVALID_COMPUTED_STRENGTH",
            ValidationCode::InvalidTreeDegree => "INVALID_TREE_DEGREE",
            ValidationCode::FrameworkCycle => "FRAMEWORK_CYCLE",
            ValidationCode::FrameworkDisconnected => "FRAMEWORK_DISCONNECTED",
            ValidationCode::TargetNotFound => "TARGET_NOT_FOUND",
            ValidationCode::RootNotRemovable => "ROOT_NOT_REMOVABLE",
            ValidationCode::IdCollision => "ID_COLLISION",
            ValidationCode::ComputedStrengthPresent => "COMPUTED_STRENGTH_PRESENT",
            ValidationCode::RelationSourceMismatch => "RELATION_SOURCE_MISMATCH",
            ValidationCode::UnsupportedContestation => "UNSUPPORTED_CONTESTATION",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ValidationCode,
    pub message: String,
    /// Location in the JSON document, e.g. `relations[id=rel-1].from`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub severity: Severity,
}

impl ValidationError {
    pub fn error(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            severity: Severity::Error,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub checked_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: !errors.iter().any(|e| e.severity == Severity::Error),
            errors,
            checked_at: Utc::now(),
        }
    }

    pub fn has_code(&self, code: ValidationCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// `CODE: message; CODE: message`
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
