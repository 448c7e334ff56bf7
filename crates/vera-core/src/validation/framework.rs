use super::{ValidationCode, ValidationError, ValidationReport};
use crate::framework::ArgumentationFramework;
use vera_integrity::group_by;

/// Check everything DF-QuAD and the audit layer rely on: root, unique ids,
/// relation endpoints, score ranges, tree degree, acyclicity, connectivity.
pub fn validate_framework(framework: &impl AsRef<ArgumentationFramework>) -> ValidationReport {
    let framework = framework.as_ref();
    let mut errors = Vec::new();
    let root = framework.root_claim_id();

    if !framework.contains_argument(root) {
        errors.push(
            ValidationError::error(
                ValidationCode::RootNotFound,
                format!("Root argument {root} not found"),
            )
            .at("rootClaimId"),
        );
    }

    for (id, group) in group_by(framework.arguments(), |a| a.id().clone()) {
        if group.len() > 1 {
            errors.push(
                ValidationError::error(
                    ValidationCode::DuplicateArgumentId,
                    format!("Argument id {id} appears {} times", group.len()),
                )
                .at(format!("arguments[id={id}]")),
            );
        }
    }
    for (id, group) in group_by(framework.relations(), |r| r.id.clone()) {
        if group.len() > 1 {
            errors.push(
                ValidationError::error(
                    ValidationCode::DuplicateRelationId,
                    format!("Relation id {id} appears {} times", group.len()),
                )
                .at(format!("relations[id={id}]")),
            );
        }
    }

    for argument in framework.arguments() {
        let id = argument.id();
        let score = argument.base_score();
        if !(0.0..=1.0).contains(&score) {
            errors.push(
                ValidationError::error(
                    ValidationCode::InvalidBaseScore,
                    format!("Argument {id} has base score {score} outside [0, 1]"),
                )
                .at(format!("arguments[id={id}].baseScore")),
            );
        }
        if let Some(strength) = argument.computed_strength() {
            if !(0.0..=1.0).contains(&strength) {
                errors.push(
                    ValidationError::error(
                        ValidationCode::InvalidComputedStrength,
                        format!("Argument {id} has computed strength {strength} outside [0, 1]"),
                    )
                    .at(format!("arguments[id={id}].computedStrength")),
                );
            }
        }
    }

    for relation in framework.relations() {
        for (field, endpoint) in [("from", &relation.from), ("to", &relation.to)] {
            if !framework.contains_argument(endpoint) {
                errors.push(
                    ValidationError::error(
                        ValidationCode::UnknownArgument,
                        format!("Relation {} references unknown argument {endpoint}", relation.id),
                    )
                    .at(format!("relations[id={}].{field}", relation.id)),
                );
            }
        }
    }

    for (id, degree) in framework.degree_violations() {
        errors.push(
            ValidationError::error(
                ValidationCode::InvalidTreeDegree,
                format!("Argument {id} has {degree} outgoing relations; expected exactly 1"),
            )
            .at(format!("arguments[id={id}]")),
        );
    }

    if !framework.is_acyclic() {
        errors.push(
            ValidationError::error(ValidationCode::FrameworkCycle, "Framework contains a cycle")
                .at("relations"),
        );
    }

    for id in framework.disconnected_arguments() {
        errors.push(
            ValidationError::error(
                ValidationCode::FrameworkDisconnected,
                format!("Argument {id} has no path to root {root}"),
            )
            .at(format!("arguments[id={id}]")),
        );
    }

    ValidationReport::from_errors(errors)
}
