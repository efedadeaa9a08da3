//! 3NF synthesis.
//!
//! One relation per distinct left side of the minimal cover, relations
//! contained in another one dropped, then a candidate-key relation appended
//! when no relation already holds a key. The result preserves every FD by
//! construction and is lossless thanks to the key relation.

use crate::attrs::AttrSet;
use crate::budget::AnalysisBudget;
use crate::closure::closure_of;
use crate::cover::{minimal_cover_with, MinimalCover};
use crate::fd::{Decomposition, Fd, RelationSchema};
use crate::keys::{
    candidate_keys_with_budget, classify_attributes, reduce_to_key, AttributeClasses, KeySearch,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationOrigin {
    /// Built from the cover FDs sharing `lhs`.
    FdGroup { lhs: AttrSet, fds: Vec<Fd> },
    /// Appended so that some relation holds a candidate key.
    CandidateKey { key: AttrSet },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedRelation {
    pub attributes: AttrSet,
    pub origin: RelationOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub relations: Vec<SynthesizedRelation>,
    pub cover: MinimalCover,
    pub keys: KeySearch,
    pub classes: AttributeClasses,
    /// `(L ∪ N)⁺`.
    pub fast_path_closure: AttrSet,
    /// `L ∪ N`, when its closure is the whole universe (it is then the only
    /// candidate key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_path_key: Option<AttrSet>,
    /// FD-group relations dropped because another relation contains them.
    pub dropped_subsumed: Vec<SynthesizedRelation>,
    pub key_relation_added: bool,
}

impl Synthesis {
    pub fn decomposition(&self) -> Decomposition {
        self.relations.iter().map(|r| r.attributes.clone()).collect()
    }
}

pub fn synthesize_3nf(schema: &RelationSchema) -> Synthesis {
    synthesize_3nf_with_budget(schema, &AnalysisBudget::default())
}

pub fn synthesize_3nf_with_budget(schema: &RelationSchema, budget: &AnalysisBudget) -> Synthesis {
    let cover = minimal_cover_with(&schema.fds, budget.redundancy_check);

    let mut groups: Vec<(AttrSet, Vec<Fd>)> = Vec::new();
    for fd in &cover.fds {
        match groups.iter_mut().find(|(lhs, _)| *lhs == fd.lhs) {
            Some((_, fds)) => fds.push(fd.clone()),
            None => groups.push((fd.lhs.clone(), vec![fd.clone()])),
        }
    }
    let grouped: Vec<SynthesizedRelation> = groups
        .into_iter()
        .map(|(lhs, fds)| SynthesizedRelation {
            attributes: fds.iter().fold(lhs.clone(), |acc, fd| acc.union(&fd.rhs)),
            origin: RelationOrigin::FdGroup { lhs, fds },
        })
        .collect();

    // Of two equal relations the first is kept.
    let mut relations = Vec::with_capacity(grouped.len() + 1);
    let mut dropped_subsumed = Vec::new();
    for (i, rel) in grouped.iter().enumerate() {
        let subsumed = grouped.iter().enumerate().any(|(j, other)| {
            j != i
                && (rel.attributes.is_proper_subset(&other.attributes)
                    || (j < i && rel.attributes == other.attributes))
        });
        if subsumed {
            dropped_subsumed.push(rel.clone());
        } else {
            relations.push(rel.clone());
        }
    }

    let keys = candidate_keys_with_budget(schema, budget);
    let classes = classify_attributes(schema);
    let core = classes.core();
    let fast_path_closure = closure_of(&core, &schema.fds);
    let fast_path_key = schema.universe.is_subset(&fast_path_closure).then_some(core);

    // A capped key search can come back empty; fall back to a key derived
    // from L ∪ N or, failing that, from the whole universe.
    let key_candidates: Vec<AttrSet> = if keys.keys.is_empty() {
        let fallback = fast_path_key
            .clone()
            .unwrap_or_else(|| reduce_to_key(&schema.universe, schema));
        vec![fallback]
    } else {
        keys.keys.clone()
    };

    let has_key = relations
        .iter()
        .any(|rel| key_candidates.iter().any(|k| k.is_subset(&rel.attributes)));
    let key_relation_added = !has_key;
    if key_relation_added {
        if let Some(key) = key_candidates.into_iter().next() {
            relations.push(SynthesizedRelation {
                attributes: key.clone(),
                origin: RelationOrigin::CandidateKey { key },
            });
        }
    }

    debug!(
        cover = cover.fds.len(),
        relations = relations.len(),
        dropped = dropped_subsumed.len(),
        key_relation_added,
        "3nf synthesis"
    );

    Synthesis {
        relations,
        cover,
        keys,
        classes,
        fast_path_closure,
        fast_path_key,
        dropped_subsumed,
        key_relation_added,
    }
}
