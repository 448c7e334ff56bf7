use super::{Contestation, ContestationKind};
use crate::argument::Relation;
use crate::framework::ArgumentationFramework;
use crate::ids::ArgumentId;
use crate::validation::{ValidationCode, ValidationError};

fn relation_problems(
    framework: &ArgumentationFramework,
    relation: &Relation,
    path: &str,
    pending_argument: Option<&ArgumentId>,
    errors: &mut Vec<ValidationError>,
) {
    if framework.relation(&relation.id).is_some() {
        errors.push(
            ValidationError::error(
                ValidationCode::IdCollision,
                format!("Relation {} already exists", relation.id),
            )
            .at(format!("{path}.id")),
        );
    }
    for (field, endpoint) in [("from", &relation.from), ("to", &relation.to)] {
        // A pending argument can only be the source; nothing in the tree can target it yet.
        let pending = field == "from" && pending_argument == Some(endpoint);
        let known = framework.contains_argument(endpoint) || pending;
        if !known {
            errors.push(
                ValidationError::error(
                    ValidationCode::UnknownArgument,
                    format!("Relation {} references unknown argument {endpoint}", relation.id),
                )
                .at(format!("{path}.{field}")),
            );
        }
    }
}

/// Pre-flight checks. Returns every problem found; empty means `apply` will
/// succeed.
pub fn validate_contestation(
    framework: &ArgumentationFramework,
    contestation: &Contestation,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match contestation.kind() {
        ContestationKind::BaseScoreModification {
            target_argument_id,
            new_base_score,
        } => {
            if !framework.contains_argument(target_argument_id) {
                errors.push(
                    ValidationError::error(
                        ValidationCode::TargetNotFound,
                        format!("Target argument {target_argument_id} not found"),
                    )
                    .at("targetArgumentId"),
                );
            }
            if !(new_base_score.is_finite() && (0.0..=1.0).contains(new_base_score)) {
                errors.push(
                    ValidationError::error(
                        ValidationCode::InvalidBaseScore,
                        format!("newBaseScore must be in [0, 1], got {new_base_score}"),
                    )
                    .at("newBaseScore"),
                );
            }
        }
        ContestationKind::ArgumentAddition {
            new_argument,
            new_relation,
        } => {
            let id = new_argument.id();
            if framework.contains_argument(id) {
                errors.push(
                    ValidationError::error(
                        ValidationCode::IdCollision,
                        format!("Argument {id} already exists"),
                    )
                    .at("newArgument.id"),
                );
            }
            if new_argument.computed_strength().is_some() {
                errors.push(
                    ValidationError::error(
                        ValidationCode::ComputedStrengthPresent,
                        format!("New argument {id} must not carry a computed strength"),
                    )
                    .at("newArgument.computedStrength"),
                );
            }
            if &new_relation.from != id {
                errors.push(
                    ValidationError::error(
                        ValidationCode::RelationSourceMismatch,
                        format!("New relation {} must originate from {id}", new_relation.id),
                    )
                    .at("newRelation.from"),
                );
            }
            relation_problems(framework, new_relation, "newRelation", Some(id), &mut errors);
        }
        ContestationKind::ArgumentRemoval { target_argument_id } => {
            if target_argument_id == framework.root_claim_id() {
                errors.push(
                    ValidationError::error(
                        ValidationCode::RootNotRemovable,
                        "Cannot remove root argument",
                    )
                    .at("targetArgumentId"),
                );
            } else if !framework.contains_argument(target_argument_id) {
                errors.push(
                    ValidationError::error(
                        ValidationCode::TargetNotFound,
                        format!("Target argument {target_argument_id} not found"),
                    )
                    .at("targetArgumentId"),
                );
            }
        }
        ContestationKind::RelationAddition { new_relation } => {
            relation_problems(framework, new_relation, "newRelation", None, &mut errors);
        }
        ContestationKind::RelationRemoval { target_relation_id } => {
            if framework.relation(target_relation_id).is_none() {
                errors.push(
                    ValidationError::error(
                        ValidationCode::TargetNotFound,
                        format!("Target relation {target_relation_id} not found"),
                    )
                    .at("targetRelationId"),
                );
            }
        }
        kind @ (ContestationKind::AssumptionChallenge { .. }
        | ContestationKind::SourceChallenge { .. }) => {
            errors.push(
                ValidationError::error(
                    ValidationCode::UnsupportedContestation,
                    format!("Unsupported contestation type: {}", kind.type_name()),
                )
                .at("type"),
            );
        }
    }

    errors
}
