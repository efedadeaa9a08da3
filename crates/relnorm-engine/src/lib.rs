//! Relnorm engine: functional-dependency analysis.
//!
//! Every analysis is a pure function from a [`RelationSchema`] (and, for the
//! chase and Algorithm Z, a [`Decomposition`]) to a result value that carries
//! the answer together with a step trace. Nothing is cached between calls.
//!
//! Loops that iterate to a fixed point are bounded by an [`AnalysisBudget`];
//! results report when a bound was hit instead of failing.
//!
//! ```text
//! closure ──► cover ──► keys ──► normal_form
//!    │          │         │
//!    │          └─────────┴────► synthesis ──► analysis
//!    ├──► chase
//!    └──► preservation
//! ```

pub mod analysis;
pub mod attrs;
pub mod budget;
pub mod chase;
pub mod closure;
pub mod cover;
pub mod fd;
pub mod import;
pub mod keys;
pub mod normal_form;
pub mod preservation;
pub mod synthesis;

pub use analysis::{analyze, analyze_with_budget, DecompositionReport, SchemaAnalysis};
pub use attrs::{AttrSet, Attribute};
pub use budget::{AnalysisBudget, RedundancyCheck};
pub use chase::{chase, chase_with_budget, ChaseResult, Symbol, Tableau};
pub use closure::{closure, closure_of, ClosureResult};
pub use cover::{minimal_cover, minimal_cover_with, MinimalCover};
pub use fd::{equivalent, implies, Decomposition, Fd, RelationSchema};
pub use keys::{candidate_keys, candidate_keys_with_budget, KeySearch};
pub use normal_form::{normal_form, NormalForm, NormalFormReport};
pub use preservation::{check_preservation, check_preservation_with_budget, PreservationReport};
pub use synthesis::{synthesize_3nf, synthesize_3nf_with_budget, Synthesis};
