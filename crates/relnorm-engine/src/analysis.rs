//! Every analysis of a schema in one value.

use crate::attrs::AttrSet;
use crate::budget::AnalysisBudget;
use crate::chase::{chase_with_budget, ChaseResult};
use crate::cover::MinimalCover;
use crate::fd::{Fd, RelationSchema};
use crate::keys::{AttributeClasses, KeySearch};
use crate::normal_form::{classify_search, NormalFormReport};
use crate::preservation::{check_preservation_with_budget, PreservationReport};
use crate::synthesis::{synthesize_3nf_with_budget, Synthesis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Chase and Algorithm Z results for a caller-supplied decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionReport {
    pub relations: Vec<AttrSet>,
    pub chase: ChaseResult,
    pub preservation: PreservationReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaAnalysis {
    pub universe: AttrSet,
    pub fds: Vec<Fd>,
    pub cover: MinimalCover,
    pub keys: KeySearch,
    pub prime: AttrSet,
    pub classes: AttributeClasses,
    pub normal_form: NormalFormReport,
    pub synthesis: Synthesis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<DecompositionReport>,
}

impl SchemaAnalysis {
    /// Whether any capped loop stopped early, making part of the analysis
    /// inconclusive.
    pub fn hit_any_cap(&self) -> bool {
        self.keys.hit_node_cap
            || self.decomposition.as_ref().is_some_and(|d| {
                d.chase.hit_iteration_cap || d.preservation.hit_iteration_cap
            })
    }
}

pub fn analyze(schema: &RelationSchema) -> SchemaAnalysis {
    analyze_with_budget(schema, None, &AnalysisBudget::default())
}

/// Cover, keys, normal form and synthesis, plus the chase and Algorithm Z
/// when a decomposition is given.
///
/// The cover and key search are run once, inside synthesis, and shared with
/// the normal-form classifier.
pub fn analyze_with_budget(
    schema: &RelationSchema,
    decomposition: Option<&[AttrSet]>,
    budget: &AnalysisBudget,
) -> SchemaAnalysis {
    let synthesis = synthesize_3nf_with_budget(schema, budget);
    let normal_form = classify_search(schema, &synthesis.cover.fds, &synthesis.keys);

    let decomposition = decomposition.map(|relations| DecompositionReport {
        relations: relations.to_vec(),
        chase: chase_with_budget(schema, relations, budget),
        preservation: check_preservation_with_budget(schema, relations, budget),
    });

    debug!(
        attributes = schema.universe.len(),
        fds = schema.fds.len(),
        level = %normal_form.level,
        "schema analysis"
    );

    SchemaAnalysis {
        universe: schema.universe.clone(),
        fds: schema.fds.clone(),
        cover: synthesis.cover.clone(),
        keys: synthesis.keys.clone(),
        prime: normal_form.prime.clone(),
        classes: synthesis.classes.clone(),
        normal_form,
        synthesis,
        decomposition,
    }
}
