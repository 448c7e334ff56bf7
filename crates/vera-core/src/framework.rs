//! Quantitative bipolar argumentation frameworks (QBAFs)
//!
//! A framework is a root claim plus arguments linked by attack/support edges
//! that point toward the argument they affect:
//!
//! ```text
//!            arg-a1 (root, τ=0.6)
//!            ▲               ▲
//!     support│               │attack
//!            │               │
//!    arg-b2 (τ=0.7)     arg-c3 (τ=0.4)
//!                            ▲
//!                     support│
//!                            │
//!                       arg-d4 (τ=0.8)
//! ```
//!
//! Construction only checks that the root exists. Tree shape, acyclicity and
//! connectivity are checked explicitly (`validation::validate_framework`) so
//! partial frameworks can still be built and inspected.
//!
//! The attacker/supporter/outgoing index is built once in the constructor and
//! owned by the value; frameworks are never mutated afterwards.

use crate::argument::{Argument, Relation, RelationType};
use crate::error::ModelError;
use crate::ids::{ArgumentId, RelationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameworkError {
    #[error("root argument {0} not found in framework")]
    RootNotFound(ArgumentId),

    #[error("argument {0} has no computed strength")]
    MissingStrength(ArgumentId),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Polarity of an argument relative to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentRole {
    /// Even number of attacks on the path to the root
    Pro,
    /// Odd number of attacks on the path to the root
    Con,
}

// ============================================================================
// Index
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct FrameworkIndex {
    root: usize,
    /// First position of each argument id
    positions: BTreeMap<ArgumentId, usize>,
    /// Attacker ids per target, sorted
    attackers: BTreeMap<ArgumentId, Vec<ArgumentId>>,
    /// Supporter ids per target, sorted
    supporters: BTreeMap<ArgumentId, Vec<ArgumentId>>,
    /// Relation positions per source, in relation-id order
    outgoing: BTreeMap<ArgumentId, Vec<usize>>,
}

impl FrameworkIndex {
    fn build(
        root: &ArgumentId,
        arguments: &[Argument],
        relations: &[Relation],
    ) -> Result<Self, FrameworkError> {
        let mut positions = BTreeMap::new();
        for (i, argument) in arguments.iter().enumerate() {
            positions.entry(argument.id().clone()).or_insert(i);
        }
        let root_position = *positions
            .get(root)
            .ok_or_else(|| FrameworkError::RootNotFound(root.clone()))?;

        let mut by_id: Vec<usize> = (0..relations.len()).collect();
        by_id.sort_by(|&a, &b| relations[a].id.cmp(&relations[b].id));

        let mut attackers: BTreeMap<ArgumentId, Vec<ArgumentId>> = BTreeMap::new();
        let mut supporters: BTreeMap<ArgumentId, Vec<ArgumentId>> = BTreeMap::new();
        let mut outgoing: BTreeMap<ArgumentId, Vec<usize>> = BTreeMap::new();
        for i in by_id {
            let relation = &relations[i];
            let bucket = match relation.relation_type {
                RelationType::Attack => &mut attackers,
                RelationType::Support => &mut supporters,
            };
            bucket
                .entry(relation.to.clone())
                .or_default()
                .push(relation.from.clone());
            outgoing.entry(relation.from.clone()).or_default().push(i);
        }
        for ids in attackers.values_mut().chain(supporters.values_mut()) {
            ids.sort();
        }

        Ok(Self {
            root: root_position,
            positions,
            attackers,
            supporters,
            outgoing,
        })
    }
}

// ============================================================================
// Framework
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawFramework")]
pub struct ArgumentationFramework {
    root_claim_id: ArgumentId,
    arguments: Vec<Argument>,
    relations: Vec<Relation>,
    #[serde(skip)]
    index: FrameworkIndex,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFramework {
    root_claim_id: ArgumentId,
    arguments: Vec<Argument>,
    #[serde(default)]
    relations: Vec<Relation>,
}

impl TryFrom<RawFramework> for ArgumentationFramework {
    type Error = FrameworkError;

    fn try_from(raw: RawFramework) -> Result<Self, Self::Error> {
        ArgumentationFramework::new(raw.root_claim_id, raw.arguments, raw.relations)
    }
}

impl AsRef<ArgumentationFramework> for ArgumentationFramework {
    fn as_ref(&self) -> &ArgumentationFramework {
        self
    }
}

impl ArgumentationFramework {
    /// Fails only if `root` is not among `arguments`.
    pub fn new(
        root: impl Into<ArgumentId>,
        arguments: Vec<Argument>,
        relations: Vec<Relation>,
    ) -> Result<Self, FrameworkError> {
        let root_claim_id = root.into();
        let index = FrameworkIndex::build(&root_claim_id, &arguments, &relations)?;
        Ok(Self {
            root_claim_id,
            arguments,
            relations,
            index,
        })
    }

    pub fn into_parts(self) -> (ArgumentId, Vec<Argument>, Vec<Relation>) {
        (self.root_claim_id, self.arguments, self.relations)
    }

    pub fn root_claim_id(&self) -> &ArgumentId {
        &self.root_claim_id
    }

    pub fn root(&self) -> &Argument {
        &self.arguments[self.index.root]
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn argument(&self, id: &ArgumentId) -> Option<&Argument> {
        self.index.positions.get(id).map(|&i| &self.arguments[i])
    }

    pub fn contains_argument(&self, id: &ArgumentId) -> bool {
        self.index.positions.contains_key(id)
    }

    pub fn relation(&self, id: &RelationId) -> Option<&Relation> {
        self.relations.iter().find(|r| &r.id == id)
    }

    /// Ids of arguments attacking `id`, ascending.
    pub fn attackers(&self, id: &ArgumentId) -> &[ArgumentId] {
        self.index
            .attackers
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ids of arguments supporting `id`, ascending.
    pub fn supporters(&self, id: &ArgumentId) -> &[ArgumentId] {
        self.index
            .supporters
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Relations leaving `id`, in relation-id order.
    pub fn outgoing(&self, id: &ArgumentId) -> impl Iterator<Item = &Relation> + '_ {
        self.index
            .outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.relations[i])
    }

    pub fn out_degree(&self, id: &ArgumentId) -> usize {
        self.index.outgoing.get(id).map_or(0, Vec::len)
    }

    /// Arguments nothing attacks or supports.
    pub fn leaves(&self) -> Vec<&Argument> {
        self.arguments
            .iter()
            .filter(|a| self.attackers(a.id()).is_empty() && self.supporters(a.id()).is_empty())
            .collect()
    }

    /// Copy with every computed strength removed.
    pub fn without_strengths(&self) -> Self {
        Self {
            arguments: self
                .arguments
                .iter()
                .map(Argument::without_computed_strength)
                .collect(),
            ..self.clone()
        }
    }

    // ------------------------------------------------------------------------
    // Paths and roles
    // ------------------------------------------------------------------------

    /// A chain of outgoing relations from `id` to the root, found depth-first
    /// in relation-id order. Empty for the root itself; `None` if unreachable.
    pub fn path_to_root(&self, id: &ArgumentId) -> Option<Vec<&Relation>> {
        if id == &self.root_claim_id {
            return Some(Vec::new());
        }
        let mut visited = BTreeSet::new();
        let mut path = Vec::new();
        if self.search_root(id, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn search_root<'a>(
        &'a self,
        current: &ArgumentId,
        visited: &mut BTreeSet<ArgumentId>,
        path: &mut Vec<&'a Relation>,
    ) -> bool {
        if !visited.insert(current.clone()) {
            return false;
        }
        for relation in self.outgoing(current) {
            path.push(relation);
            if relation.to == self.root_claim_id || self.search_root(&relation.to, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Pro/con by attack parity on the path to the root; `None` if disconnected.
    pub fn classify_argument(&self, id: &ArgumentId) -> Option<ArgumentRole> {
        let path = self.path_to_root(id)?;
        let attacks = path.iter().filter(|r| r.is_attack()).count();
        Some(if attacks % 2 == 0 {
            ArgumentRole::Pro
        } else {
            ArgumentRole::Con
        })
    }

    // ------------------------------------------------------------------------
    // Structural predicates
    // ------------------------------------------------------------------------

    pub fn is_acyclic(&self) -> bool {
        let mut visiting = BTreeSet::new();
        let mut done = BTreeSet::new();
        let mut starts: Vec<&ArgumentId> = self.index.positions.keys().collect();
        starts.extend(self.relations.iter().map(|r| &r.from));
        !starts
            .into_iter()
            .any(|id| self.has_cycle_from(id, &mut visiting, &mut done))
    }

    fn has_cycle_from<'a>(
        &'a self,
        id: &'a ArgumentId,
        visiting: &mut BTreeSet<&'a ArgumentId>,
        done: &mut BTreeSet<&'a ArgumentId>,
    ) -> bool {
        if done.contains(id) {
            return false;
        }
        if !visiting.insert(id) {
            // back edge
            return true;
        }
        for relation in self.outgoing(id) {
            if self.has_cycle_from(&relation.to, visiting, done) {
                return true;
            }
        }
        visiting.remove(id);
        done.insert(id);
        false
    }

    /// Non-root arguments with no path to the root, in argument order.
    pub fn disconnected_arguments(&self) -> Vec<&ArgumentId> {
        let mut reached: BTreeSet<&ArgumentId> = BTreeSet::new();
        let mut queue = VecDeque::from([&self.root_claim_id]);
        reached.insert(&self.root_claim_id);
        while let Some(current) = queue.pop_front() {
            for source in self.attackers(current).iter().chain(self.supporters(current)) {
                if reached.insert(source) {
                    queue.push_back(source);
                }
            }
        }

        let mut seen = BTreeSet::new();
        self.arguments
            .iter()
            .map(Argument::id)
            .filter(|id| !reached.contains(id) && seen.insert(*id))
            .collect()
    }

    pub fn is_connected(&self) -> bool {
        self.disconnected_arguments().is_empty()
    }

    /// Non-root arguments whose out-degree is not exactly one.
    pub fn degree_violations(&self) -> Vec<(&ArgumentId, usize)> {
        let mut seen = BTreeSet::new();
        self.arguments
            .iter()
            .map(Argument::id)
            .filter(|id| *id != &self.root_claim_id && seen.insert(*id))
            .map(|id| (id, self.out_degree(id)))
            .filter(|(_, degree)| *degree != 1)
            .collect()
    }

    /// Acyclic, connected, and every non-root argument has out-degree 1.
    pub fn is_tree_structure(&self) -> bool {
        self.degree_violations().is_empty() && self.is_acyclic() && self.is_connected()
    }
}

// ============================================================================
// Evaluated Frameworks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticsType {
    #[serde(rename = "df-quad")]
    DfQuad,
}

/// A framework whose every argument carries a computed strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawEvaluatedFramework")]
pub struct EvaluatedFramework {
    #[serde(flatten)]
    framework: ArgumentationFramework,
    semantics_used: SemanticsType,
    evaluated_at: DateTime<Utc>,
    #[serde(skip)]
    final_strength: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluatedFramework {
    root_claim_id: ArgumentId,
    arguments: Vec<Argument>,
    #[serde(default)]
    relations: Vec<Relation>,
    semantics_used: SemanticsType,
    evaluated_at: DateTime<Utc>,
}

impl TryFrom<RawEvaluatedFramework> for EvaluatedFramework {
    type Error = FrameworkError;

    fn try_from(raw: RawEvaluatedFramework) -> Result<Self, Self::Error> {
        let framework =
            ArgumentationFramework::new(raw.root_claim_id, raw.arguments, raw.relations)?;
        EvaluatedFramework::from_evaluated(framework, raw.semantics_used, raw.evaluated_at)
    }
}

impl AsRef<ArgumentationFramework> for EvaluatedFramework {
    fn as_ref(&self) -> &ArgumentationFramework {
        &self.framework
    }
}

impl EvaluatedFramework {
    /// Attach `strengths` to every argument of `framework`.
    pub fn new(
        framework: &ArgumentationFramework,
        strengths: &BTreeMap<ArgumentId, f64>,
        semantics_used: SemanticsType,
        evaluated_at: DateTime<Utc>,
    ) -> Result<Self, FrameworkError> {
        let arguments = framework
            .arguments()
            .iter()
            .map(|argument| {
                let strength = strengths
                    .get(argument.id())
                    .copied()
                    .ok_or_else(|| FrameworkError::MissingStrength(argument.id().clone()))?;
                Ok(argument.with_computed_strength(strength)?)
            })
            .collect::<Result<Vec<_>, FrameworkError>>()?;

        let evaluated = ArgumentationFramework::new(
            framework.root_claim_id().clone(),
            arguments,
            framework.relations().to_vec(),
        )?;
        Self::from_evaluated(evaluated, semantics_used, evaluated_at)
    }

    fn from_evaluated(
        framework: ArgumentationFramework,
        semantics_used: SemanticsType,
        evaluated_at: DateTime<Utc>,
    ) -> Result<Self, FrameworkError> {
        if let Some(missing) = framework
            .arguments()
            .iter()
            .find(|a| a.computed_strength().is_none())
        {
            return Err(FrameworkError::MissingStrength(missing.id().clone()));
        }
        let final_strength = framework
            .root()
            .computed_strength()
            .ok_or_else(|| FrameworkError::MissingStrength(framework.root_claim_id().clone()))?;
        Ok(Self {
            framework,
            semantics_used,
            evaluated_at,
            final_strength,
        })
    }

    pub fn framework(&self) -> &ArgumentationFramework {
        &self.framework
    }

    pub fn semantics_used(&self) -> SemanticsType {
        self.semantics_used
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    /// σ(root).
    pub fn final_strength(&self) -> f64 {
        self.final_strength
    }

    pub fn strength(&self, id: &ArgumentId) -> Option<f64> {
        self.framework.argument(id).and_then(Argument::computed_strength)
    }

    pub fn strengths(&self) -> BTreeMap<ArgumentId, f64> {
        self.framework
            .arguments()
            .iter()
            .filter_map(|a| a.computed_strength().map(|s| (a.id().clone(), s)))
            .collect()
    }
}
