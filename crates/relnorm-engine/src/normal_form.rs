//! Normal-form classification (1NF through BCNF).
//!
//! The classifier is a short-circuiting sequence of checks over the minimal
//! cover: 2NF, then 3NF, then BCNF. The first failing check fixes the level
//! and reports the FD that broke it.

use crate::attrs::AttrSet;
use crate::budget::AnalysisBudget;
use crate::closure::closure_of;
use crate::cover::minimal_cover_with;
use crate::fd::{Fd, RelationSchema};
use crate::keys::{candidate_keys_with_budget, fallback_key, prime_attributes, KeySearch};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NormalForm {
    #[serde(rename = "1NF")]
    First,
    #[serde(rename = "2NF")]
    Second,
    #[serde(rename = "3NF")]
    Third,
    #[serde(rename = "BCNF")]
    Bcnf,
}

impl fmt::Display for NormalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NormalForm::First => "1NF",
            NormalForm::Second => "2NF",
            NormalForm::Third => "3NF",
            NormalForm::Bcnf => "BCNF",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A non-prime attribute depends on a proper subset of a key (breaks 2NF).
    PartialDependency,
    /// A non-prime attribute depends on a non-superkey (breaks 3NF).
    TransitiveDependency,
    /// A non-trivial FD has a non-superkey determinant (breaks BCNF).
    NonSuperkeyDeterminant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub fd: Fd,
    /// The key whose proper subset determines the attribute, for partial
    /// dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<AttrSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalFormReport {
    pub level: NormalForm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
    /// The keys the checks ran against. After a capped search this is the
    /// keys found so far, or a single derived key when none were.
    pub keys: Vec<AttrSet>,
    pub prime: AttrSet,
    /// The key search stopped at its node cap. `prime` may then be missing
    /// attributes, so any level below BCNF is inconclusive.
    pub hit_node_cap: bool,
}

/// Classify a schema given its minimal cover and candidate keys.
///
/// Superkey tests use the closure over `cover`, which is equivalent to the
/// schema's own FDs. Trivial FDs never violate anything.
pub fn classify(universe: &AttrSet, cover: &[Fd], keys: &[AttrSet]) -> NormalFormReport {
    let prime = prime_attributes(keys);
    let relevant: Vec<&Fd> = cover.iter().filter(|fd| !fd.is_trivial()).collect();
    let is_superkey = |attrs: &AttrSet| universe.is_subset(&closure_of(attrs, cover));
    let non_prime_rhs = |fd: &Fd| !fd.rhs.difference(&fd.lhs).difference(&prime).is_empty();

    let report = |level: NormalForm, violation: Option<Violation>| NormalFormReport {
        level,
        violation,
        keys: keys.to_vec(),
        prime: prime.clone(),
        hit_node_cap: false,
    };

    for &fd in &relevant {
        if !non_prime_rhs(fd) {
            continue;
        }
        if let Some(key) = keys.iter().find(|k| fd.lhs.is_proper_subset(k)) {
            debug!(fd = %fd, key = %key, "partial dependency");
            return report(
                NormalForm::First,
                Some(Violation {
                    kind: ViolationKind::PartialDependency,
                    fd: fd.clone(),
                    key: Some(key.clone()),
                }),
            );
        }
    }

    for &fd in &relevant {
        if non_prime_rhs(fd) && !is_superkey(&fd.lhs) {
            debug!(fd = %fd, "transitive dependency");
            return report(
                NormalForm::Second,
                Some(Violation {
                    kind: ViolationKind::TransitiveDependency,
                    fd: fd.clone(),
                    key: None,
                }),
            );
        }
    }

    for &fd in &relevant {
        if !is_superkey(&fd.lhs) {
            debug!(fd = %fd, "non-superkey determinant");
            return report(
                NormalForm::Third,
                Some(Violation {
                    kind: ViolationKind::NonSuperkeyDeterminant,
                    fd: fd.clone(),
                    key: None,
                }),
            );
        }
    }

    report(NormalForm::Bcnf, None)
}

/// Minimal cover, candidate keys, then [`classify`].
pub fn normal_form(schema: &RelationSchema) -> NormalFormReport {
    normal_form_with_budget(schema, &AnalysisBudget::default())
}

pub fn normal_form_with_budget(schema: &RelationSchema, budget: &AnalysisBudget) -> NormalFormReport {
    let cover = minimal_cover_with(&schema.fds, budget.redundancy_check);
    let keys = candidate_keys_with_budget(schema, budget);
    classify_search(schema, &cover.fds, &keys)
}

/// [`classify`] against the outcome of a key search.
///
/// A BCNF verdict only needs superkey tests and holds for any set of real
/// keys, so it stays conclusive after a capped search. Lower levels are
/// flagged with `hit_node_cap`.
pub fn classify_search(schema: &RelationSchema, cover: &[Fd], search: &KeySearch) -> NormalFormReport {
    if !search.hit_node_cap {
        return classify(&schema.universe, cover, &search.keys);
    }

    let keys = if search.keys.is_empty() {
        vec![fallback_key(schema)]
    } else {
        search.keys.clone()
    };
    let mut report = classify(&schema.universe, cover, &keys);
    report.hit_node_cap = true;
    warn!(level = %report.level, "normal form computed from an incomplete key search");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fds: &[(&str, &str)]) -> RelationSchema {
        RelationSchema::from_fds(fds.iter().map(|(l, r)| Fd::letters(l, r)).collect())
    }

    #[test]
    fn chain_stops_at_2nf() {
        let report = normal_form(&schema(&[("A", "B"), ("B", "C"), ("C", "D")]));
        assert_eq!(report.level, NormalForm::Second);
        let violation = report.violation.unwrap();
        assert_eq!(violation.kind, ViolationKind::TransitiveDependency);
        assert_eq!(violation.fd, Fd::letters("B", "C"));
        assert_eq!(report.keys, vec![AttrSet::letters("A")]);
    }

    #[test]
    fn partial_dependency_is_1nf() {
        // Key AB; B -> C is partial.
        let report = normal_form(&schema(&[("AB", "D"), ("B", "C")]));
        assert_eq!(report.level, NormalForm::First);
        let violation = report.violation.unwrap();
        assert_eq!(violation.kind, ViolationKind::PartialDependency);
        assert_eq!(violation.fd, Fd::letters("B", "C"));
        assert_eq!(violation.key, Some(AttrSet::letters("AB")));
    }

    #[test]
    fn prime_rhs_is_3nf_but_not_bcnf() {
        // Keys AB and AC; C -> B has a prime right side.
        let report = normal_form(&schema(&[("AB", "C"), ("C", "B")]));
        assert_eq!(report.level, NormalForm::Third);
        assert_eq!(
            report.violation.map(|v| v.kind),
            Some(ViolationKind::NonSuperkeyDeterminant)
        );
        assert_eq!(report.prime, AttrSet::letters("ABC"));
    }

    #[test]
    fn key_determinants_are_bcnf() {
        let report = normal_form(&schema(&[("A", "BC"), ("BC", "A")]));
        assert_eq!(report.level, NormalForm::Bcnf);
        assert!(report.violation.is_none());
    }

    #[test]
    fn capped_key_search_is_flagged_and_falls_back_to_a_derived_key() {
        let s = schema(&[("AB", "D"), ("B", "C")]);
        let full = normal_form(&s);
        assert_eq!(full.level, NormalForm::First);
        assert!(!full.hit_node_cap);

        let budget = AnalysisBudget {
            max_key_nodes: 2,
            ..AnalysisBudget::default()
        };
        let capped = normal_form_with_budget(&s, &budget);
        assert!(capped.hit_node_cap);
        assert_eq!(capped.level, full.level);
        assert_eq!(capped.keys, vec![AttrSet::letters("AB")]);
        assert_eq!(
            capped.violation.map(|v| v.kind),
            Some(ViolationKind::PartialDependency)
        );

        let json = serde_json::to_value(normal_form_with_budget(&s, &budget)).unwrap();
        assert_eq!(json["hit_node_cap"], true);
    }

    #[test]
    fn bcnf_survives_a_capped_key_search() {
        let s = schema(&[("A", "BC"), ("BC", "A")]);
        let budget = AnalysisBudget {
            max_key_nodes: 1,
            ..AnalysisBudget::default()
        };
        let report = normal_form_with_budget(&s, &budget);
        assert!(report.hit_node_cap);
        assert_eq!(report.level, NormalForm::Bcnf);
    }

    #[test]
    fn display_and_serde_use_textbook_names() {
        assert_eq!(NormalForm::Bcnf.to_string(), "BCNF");
        assert_eq!(serde_json::to_string(&NormalForm::Second).unwrap(), "\"2NF\"");
        assert!(NormalForm::First < NormalForm::Bcnf);
    }
}
