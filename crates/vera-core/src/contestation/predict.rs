//! Effect prediction without re-evaluation.
//!
//! DF-QuAD over a tree is monotone: raising a pro argument's base score (or
//! adding a pro argument) never lowers the root, and the reverse for con
//! arguments. The role of the touched argument plus the direction of the
//! change is therefore enough to call the sign. Anything else is
//! `indeterminate`; nothing is guessed.

use super::{apply_contestation, Contestation, ContestationKind};
use crate::framework::{ArgumentRole, ArgumentationFramework};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestationEffect {
    WillIncrease,
    WillDecrease,
    NoEffect,
    Indeterminate,
}

impl ContestationEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContestationEffect::WillIncrease => "will_increase",
            ContestationEffect::WillDecrease => "will_decrease",
            ContestationEffect::NoEffect => "no_effect",
            ContestationEffect::Indeterminate => "indeterminate",
        }
    }

    /// Whether an observed root strength delta is consistent with this
    /// prediction. Monotonicity is non-strict, so zero agrees with either
    /// direction.
    pub fn agrees_with_delta(&self, delta: f64) -> bool {
        match self {
            ContestationEffect::WillIncrease => delta >= 0.0,
            ContestationEffect::WillDecrease => delta <= 0.0,
            ContestationEffect::NoEffect => delta == 0.0,
            ContestationEffect::Indeterminate => true,
        }
    }

    fn from_role(role: ArgumentRole, raises: bool) -> Self {
        match (role, raises) {
            (ArgumentRole::Pro, true) | (ArgumentRole::Con, false) => {
                ContestationEffect::WillIncrease
            }
            (ArgumentRole::Pro, false) | (ArgumentRole::Con, true) => {
                ContestationEffect::WillDecrease
            }
        }
    }
}

impl fmt::Display for ContestationEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `no_effect` and `indeterminate` are compatible with anything; two
/// directional effects are compatible only if equal.
pub fn are_effects_compatible(a: ContestationEffect, b: ContestationEffect) -> bool {
    use ContestationEffect::{Indeterminate, NoEffect};
    matches!(a, NoEffect | Indeterminate) || matches!(b, NoEffect | Indeterminate) || a == b
}

pub fn predict_contestation_effect(
    framework: &ArgumentationFramework,
    contestation: &Contestation,
) -> ContestationEffect {
    match contestation.kind() {
        ContestationKind::BaseScoreModification {
            target_argument_id,
            new_base_score,
        } => {
            let Some(target) = framework.argument(target_argument_id) else {
                return ContestationEffect::Indeterminate;
            };
            let Some(role) = framework.classify_argument(target_argument_id) else {
                return ContestationEffect::Indeterminate;
            };
            match new_base_score.partial_cmp(&target.base_score()) {
                Some(Ordering::Equal) => ContestationEffect::NoEffect,
                Some(Ordering::Greater) => ContestationEffect::from_role(role, true),
                Some(Ordering::Less) => ContestationEffect::from_role(role, false),
                None => ContestationEffect::Indeterminate,
            }
        }
        ContestationKind::ArgumentAddition { new_argument, .. } => {
            match apply_contestation(framework, contestation)
                .ok()
                .and_then(|next| next.classify_argument(new_argument.id()))
            {
                Some(role) => ContestationEffect::from_role(role, true),
                None => ContestationEffect::Indeterminate,
            }
        }
        ContestationKind::ArgumentRemoval { target_argument_id } => {
            if target_argument_id == framework.root_claim_id() {
                return ContestationEffect::Indeterminate;
            }
            match framework.classify_argument(target_argument_id) {
                Some(role) => ContestationEffect::from_role(role, false),
                None => ContestationEffect::Indeterminate,
            }
        }
        ContestationKind::RelationAddition { .. }
        | ContestationKind::RelationRemoval { .. }
        | ContestationKind::AssumptionChallenge { .. }
        | ContestationKind::SourceChallenge { .. } => ContestationEffect::Indeterminate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{Argument, Relation};
    use crate::toy_case::toy_framework;
    use super::ContestationEffect::*;

    fn modify(id: &str, score: f64) -> Contestation {
        Contestation::base_score_modification(id, score, "x").unwrap()
    }

    #[test]
    fn test_base_score_direction_times_role() {
        let fw = toy_framework().unwrap();
        assert_eq!(predict_contestation_effect(&fw, &modify("arg-b2", 0.9)), WillIncrease);
        assert_eq!(predict_contestation_effect(&fw, &modify("arg-b2", 0.1)), WillDecrease);
        assert_eq!(predict_contestation_effect(&fw, &modify("arg-c3", 0.9)), WillDecrease);
        assert_eq!(predict_contestation_effect(&fw, &modify("arg-d4", 0.1)), WillIncrease);
        assert_eq!(predict_contestation_effect(&fw, &modify("arg-b2", 0.7)), NoEffect);
        assert_eq!(predict_contestation_effect(&fw, &modify("arg-zz", 0.7)), Indeterminate);
    }

    #[test]
    fn test_addition_uses_new_role() {
        let fw = toy_framework().unwrap();
        let attack_root = Contestation::argument_addition(
            Argument::new("arg-e5", "new", 0.5).unwrap(),
            Relation::attack("rel-4", "arg-e5", "arg-a1"),
            "x",
        )
        .unwrap();
        assert_eq!(predict_contestation_effect(&fw, &attack_root), WillDecrease);

        let attack_con = Contestation::argument_addition(
            Argument::new("arg-e5", "new", 0.5).unwrap(),
            Relation::attack("rel-4", "arg-e5", "arg-c3"),
            "x",
        )
        .unwrap();
        assert_eq!(predict_contestation_effect(&fw, &attack_con), WillIncrease);

        let dangling = Contestation::argument_addition(
            Argument::new("arg-e5", "new", 0.5).unwrap(),
            Relation::attack("rel-4", "arg-e5", "arg-nowhere"),
            "x",
        )
        .unwrap();
        assert_eq!(predict_contestation_effect(&fw, &dangling), Indeterminate);
    }

    #[test]
    fn test_removal_inverts_role() {
        let fw = toy_framework().unwrap();
        let remove_pro = Contestation::argument_removal("arg-b2", "x");
        let remove_con = Contestation::argument_removal("arg-c3", "x");
        assert_eq!(predict_contestation_effect(&fw, &remove_pro), WillDecrease);
        assert_eq!(predict_contestation_effect(&fw, &remove_con), WillIncrease);
        let relation = Contestation::relation_removal("rel-1", "x");
        assert_eq!(predict_contestation_effect(&fw, &relation), Indeterminate);
    }

    #[test]
    fn test_compatibility() {
        assert!(are_effects_compatible(WillIncrease, WillIncrease));
        assert!(!are_effects_compatible(WillIncrease, WillDecrease));
        assert!(are_effects_compatible(NoEffect, WillDecrease));
        assert!(are_effects_compatible(WillIncrease, Indeterminate));
    }

    #[test]
    fn test_agrees_with_delta() {
        assert!(WillIncrease.agrees_with_delta(0.1));
        assert!(WillIncrease.agrees_with_delta(0.0));
        assert!(!WillIncrease.agrees_with_delta(-0.1));
        assert!(!NoEffect.agrees_with_delta(0.1));
        assert!(Indeterminate.agrees_with_delta(-1.0));
    }
}
