use super::{Contestation, ContestationError, ContestationKind};
use crate::argument::Relation;
use crate::framework::ArgumentationFramework;
use tracing::debug;

fn require_endpoints(
    framework: &ArgumentationFramework,
    relation: &Relation,
) -> Result<(), ContestationError> {
    for endpoint in [&relation.from, &relation.to] {
        if !framework.contains_argument(endpoint) {
            return Err(ContestationError::ArgumentNotFound(endpoint.clone()));
        }
    }
    Ok(())
}

fn require_new_relation_id(
    framework: &ArgumentationFramework,
    relation: &Relation,
) -> Result<(), ContestationError> {
    if framework.relation(&relation.id).is_some() {
        return Err(ContestationError::IdCollision(relation.id.to_string()));
    }
    Ok(())
}

/// Produce the framework `contestation` describes. The input is untouched and
/// the output lists arguments and relations in ascending id order.
///
/// The output carries no computed strengths: any strength taken from the
/// input would describe the framework before the change.
pub fn apply_contestation(
    framework: &ArgumentationFramework,
    contestation: &Contestation,
) -> Result<ArgumentationFramework, ContestationError> {
    let (root_claim_id, mut arguments, mut relations) = framework.without_strengths().into_parts();

    match contestation.kind() {
        ContestationKind::BaseScoreModification {
            target_argument_id,
            new_base_score,
        } => {
            let target = arguments
                .iter_mut()
                .find(|a| a.id() == target_argument_id)
                .ok_or_else(|| ContestationError::ArgumentNotFound(target_argument_id.clone()))?;
            *target = target.with_base_score(*new_base_score)?;
        }
        ContestationKind::ArgumentAddition {
            new_argument,
            new_relation,
        } => {
            if framework.contains_argument(new_argument.id()) {
                return Err(ContestationError::IdCollision(new_argument.id().to_string()));
            }
            if new_argument.computed_strength().is_some() {
                return Err(ContestationError::ComputedStrengthPresent(new_argument.id().clone()));
            }
            if &new_relation.from != new_argument.id() {
                return Err(ContestationError::RelationSourceMismatch {
                    relation: new_relation.id.clone(),
                    argument: new_argument.id().clone(),
                });
            }
            require_new_relation_id(framework, new_relation)?;
            if !framework.contains_argument(&new_relation.to) {
                return Err(ContestationError::ArgumentNotFound(new_relation.to.clone()));
            }
            arguments.push(new_argument.clone());
            relations.push(new_relation.clone());
        }
        ContestationKind::ArgumentRemoval { target_argument_id } => {
            if target_argument_id == framework.root_claim_id() {
                return Err(ContestationError::RootNotRemovable(target_argument_id.clone()));
            }
            if !framework.contains_argument(target_argument_id) {
                return Err(ContestationError::ArgumentNotFound(target_argument_id.clone()));
            }
            arguments.retain(|a| a.id() != target_argument_id);
            relations.retain(|r| !r.touches(target_argument_id));
        }
        ContestationKind::RelationAddition { new_relation } => {
            require_new_relation_id(framework, new_relation)?;
            require_endpoints(framework, new_relation)?;
            relations.push(new_relation.clone());
        }
        ContestationKind::RelationRemoval { target_relation_id } => {
            if framework.relation(target_relation_id).is_none() {
                return Err(ContestationError::RelationNotFound(target_relation_id.clone()));
            }
            relations.retain(|r| &r.id != target_relation_id);
        }
        kind @ (ContestationKind::AssumptionChallenge { .. }
        | ContestationKind::SourceChallenge { .. }) => {
            return Err(ContestationError::Unsupported(kind.type_name()));
        }
    }

    arguments.sort_by(|a, b| a.id().cmp(b.id()));
    relations.sort_by(|a, b| a.id.cmp(&b.id));

    let next = ArgumentationFramework::new(root_claim_id, arguments, relations)?;
    debug!(
        contestation = %contestation.id(),
        kind = contestation.type_name(),
        arguments = next.arguments().len(),
        relations = next.relations().len(),
        "applied contestation"
    );
    Ok(next)
}
