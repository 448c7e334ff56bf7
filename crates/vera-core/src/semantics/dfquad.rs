//! DF-QuAD (Discontinuity-Free Quantitative Argumentation Debate)
//!
//! ```text
//!   F(v₁..vₙ) = 1 − ∏(1 − vᵢ)          F() = 0
//!
//!   C(v₀, va, vs) = v₀                          if va = vs
//!                 = v₀ − v₀·|vs − va|           if va > vs
//!                 = v₀ + (1 − v₀)·|vs − va|     if va < vs
//!
//!   σ(a) = C(τ(a), F(σ(attackers)), F(σ(supporters)))
//! ```
//!
//! Arguments are evaluated in Kahn topological order with ties broken by
//! ascending id, and attacker/supporter strengths are aggregated in ascending
//! id order. Two frameworks with the same arguments and relations therefore
//! evaluate to bit-identical strengths whatever their array order.

use super::{GradualSemantics, SemanticsError};
use crate::framework::{ArgumentationFramework, EvaluatedFramework, SemanticsType};
use crate::ids::ArgumentId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// `1 − ∏(1 − vᵢ)`, folded left to right; zero for no values.
pub fn aggregate(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    1.0 - values.iter().fold(1.0, |acc, v| acc * (1.0 - v))
}

/// Combine a base score with attack and support aggregates.
pub fn combine(base_score: f64, attack: f64, support: f64) -> f64 {
    if attack == support {
        base_score
    } else if attack > support {
        base_score - base_score * (support - attack).abs()
    } else {
        base_score + (1.0 - base_score) * (support - attack).abs()
    }
}

/// Per-argument breakdown, for explaining a computed strength.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentEvaluation {
    pub argument_id: ArgumentId,
    pub base_score: f64,
    pub attacker_strengths: Vec<(ArgumentId, f64)>,
    pub supporter_strengths: Vec<(ArgumentId, f64)>,
    pub attack_aggregate: f64,
    pub support_aggregate: f64,
    pub computed_strength: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DfQuad;

impl DfQuad {
    pub fn compute_strength(&self, base_score: f64, attackers: &[f64], supporters: &[f64]) -> f64 {
        combine(base_score, aggregate(attackers), aggregate(supporters))
    }

    /// Topological order over `from → to` edges, smallest ready id first.
    pub fn evaluation_order(
        &self,
        framework: &ArgumentationFramework,
    ) -> Result<Vec<ArgumentId>, SemanticsError> {
        let mut relations: Vec<_> = framework.relations().iter().collect();
        relations.sort_by(|a, b| a.id.cmp(&b.id));
        for relation in &relations {
            for endpoint in [&relation.from, &relation.to] {
                if !framework.contains_argument(endpoint) {
                    return Err(SemanticsError::DanglingRelation {
                        relation: relation.id.clone(),
                        endpoint: endpoint.clone(),
                    });
                }
            }
        }

        let mut in_degree: BTreeMap<&ArgumentId, usize> =
            framework.arguments().iter().map(|a| (a.id(), 0)).collect();
        for relation in &relations {
            if let Some(degree) = in_degree.get_mut(&relation.to) {
                *degree += 1;
            }
        }

        let mut ready: BTreeSet<&ArgumentId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());

        while let Some(current) = ready.pop_first() {
            order.push(current.clone());
            for relation in framework.outgoing(current) {
                if let Some(degree) = in_degree.get_mut(&relation.to) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(&relation.to);
                    }
                }
            }
        }

        if order.len() < in_degree.len() {
            let remaining = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(id, _)| id.clone())
                .collect();
            return Err(SemanticsError::FrameworkCycle { remaining });
        }
        Ok(order)
    }

    fn strengths_of(
        argument: &ArgumentId,
        ids: &[ArgumentId],
        strengths: &BTreeMap<ArgumentId, f64>,
    ) -> Result<Vec<(ArgumentId, f64)>, SemanticsError> {
        ids.iter()
            .map(|id| {
                strengths
                    .get(id)
                    .map(|s| (id.clone(), *s))
                    .ok_or_else(|| SemanticsError::MissingStrength {
                        argument: argument.clone(),
                        missing: id.clone(),
                    })
            })
            .collect()
    }

    fn explain_with(
        &self,
        framework: &ArgumentationFramework,
        id: &ArgumentId,
        base_score: f64,
        strengths: &BTreeMap<ArgumentId, f64>,
    ) -> Result<ArgumentEvaluation, SemanticsError> {
        let attacker_strengths = Self::strengths_of(id, framework.attackers(id), strengths)?;
        let supporter_strengths = Self::strengths_of(id, framework.supporters(id), strengths)?;
        let attacks: Vec<f64> = attacker_strengths.iter().map(|(_, s)| *s).collect();
        let supports: Vec<f64> = supporter_strengths.iter().map(|(_, s)| *s).collect();
        let attack_aggregate = aggregate(&attacks);
        let support_aggregate = aggregate(&supports);

        Ok(ArgumentEvaluation {
            argument_id: id.clone(),
            base_score,
            attacker_strengths,
            supporter_strengths,
            attack_aggregate,
            support_aggregate,
            computed_strength: combine(base_score, attack_aggregate, support_aggregate),
        })
    }

    /// Recompute the breakdown of one argument of an evaluated framework.
    pub fn explain(
        &self,
        evaluated: &EvaluatedFramework,
        id: &ArgumentId,
    ) -> Result<Option<ArgumentEvaluation>, SemanticsError> {
        let framework = evaluated.framework();
        let Some(argument) = framework.argument(id) else {
            return Ok(None);
        };
        let strengths = evaluated.strengths();
        self.explain_with(framework, id, argument.base_score(), &strengths)
            .map(Some)
    }
}

impl GradualSemantics for DfQuad {
    fn semantics_type(&self) -> SemanticsType {
        SemanticsType::DfQuad
    }

    fn evaluate_at(
        &self,
        framework: &ArgumentationFramework,
        evaluated_at: DateTime<Utc>,
    ) -> Result<EvaluatedFramework, SemanticsError> {
        let order = self.evaluation_order(framework)?;

        let mut strengths: BTreeMap<ArgumentId, f64> = BTreeMap::new();
        for id in &order {
            let base_score = framework
                .argument(id)
                .map(|a| a.base_score())
                .ok_or_else(|| SemanticsError::MissingStrength {
                    argument: id.clone(),
                    missing: id.clone(),
                })?;
            let evaluation = self.explain_with(framework, id, base_score, &strengths)?;
            strengths.insert(id.clone(), evaluation.computed_strength);
        }

        let evaluated =
            EvaluatedFramework::new(framework, &strengths, self.semantics_type(), evaluated_at)?;
        debug!(
            arguments = order.len(),
            root = %framework.root_claim_id(),
            root_strength = evaluated.final_strength(),
            "df-quad evaluation complete"
        );
        Ok(evaluated)
    }
}

/// Evaluate `framework` with DF-QuAD, stamped with the current time.
pub fn evaluate_with_dfquad(
    framework: &ArgumentationFramework,
) -> Result<EvaluatedFramework, SemanticsError> {
    DfQuad.evaluate(framework)
}
