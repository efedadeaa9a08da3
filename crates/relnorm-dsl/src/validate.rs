//! Caller-side validation contract.
//!
//! The analysis engine assumes well-formed input (non-empty FD sides, small
//! attribute universes, covering decompositions) and does not re-check it.
//! These checks run on a parsed [`FdModuleV1`] before it is imported.

use crate::fd_v1::{is_valid_attribute_name, FdModuleV1, Name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Size limits enforced before any analysis runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLimits {
    pub max_fds: usize,
    pub max_attributes: usize,
    /// Candidate-key search explores attribute combinations, so it gets a
    /// stricter bound than the other analyses.
    pub key_search_max_attributes: usize,
    pub key_search_max_fds: usize,
    pub min_decomposition_relations: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_fds: 30,
            max_attributes: 15,
            key_search_max_attributes: 12,
            key_search_max_fds: 20,
            min_decomposition_relations: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdSide {
    Left,
    Right,
}

impl fmt::Display for FdSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FdSide::Left => f.write_str("left-hand"),
            FdSide::Right => f.write_str("right-hand"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("fd #{index} has an empty {side} side")]
    EmptySide { index: usize, side: FdSide },
    #[error("invalid attribute name `{0}`")]
    InvalidAttribute(Name),
    #[error("too many functional dependencies: {count} (limit {limit})")]
    TooManyFds { count: usize, limit: usize },
    #[error("too many attributes: {count} (limit {limit})")]
    TooManyAttributes { count: usize, limit: usize },
    #[error("attribute `{attribute}` in {context} is not part of the schema")]
    UnknownAttribute { attribute: Name, context: String },
    #[error("decomposition needs at least {min} relations, got {count}")]
    TooFewRelations { count: usize, min: usize },
    #[error("decomposition does not cover attributes: {}", .missing.join(", "))]
    UncoveredAttributes { missing: Vec<Name> },
}

/// Shape and size checks shared by every analysis.
///
/// FD numbering in errors is 1-based, matching the order in the module.
pub fn validate_module(
    module: &FdModuleV1,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    for (i, fd) in module.fds.iter().enumerate() {
        if fd.lhs.is_empty() {
            return Err(ValidationError::EmptySide {
                index: i + 1,
                side: FdSide::Left,
            });
        }
        if fd.rhs.is_empty() {
            return Err(ValidationError::EmptySide {
                index: i + 1,
                side: FdSide::Right,
            });
        }
    }

    let universe = module.universe();
    if let Some(bad) = universe.iter().find(|a| !is_valid_attribute_name(a)) {
        return Err(ValidationError::InvalidAttribute(bad.clone()));
    }

    if module.fds.len() > limits.max_fds {
        return Err(ValidationError::TooManyFds {
            count: module.fds.len(),
            limit: limits.max_fds,
        });
    }
    if universe.len() > limits.max_attributes {
        return Err(ValidationError::TooManyAttributes {
            count: universe.len(),
            limit: limits.max_attributes,
        });
    }

    // A declared schema is authoritative: FDs may not introduce new attributes.
    if let Some(schema) = &module.schema {
        let declared: BTreeSet<&Name> = schema.attributes.iter().collect();
        for (i, fd) in module.fds.iter().enumerate() {
            if let Some(attr) = fd.lhs.iter().chain(&fd.rhs).find(|a| !declared.contains(a)) {
                return Err(ValidationError::UnknownAttribute {
                    attribute: attr.clone(),
                    context: format!("fd #{}", i + 1),
                });
            }
        }
    }

    for relation in &module.relations {
        if let Some(attr) = relation.attributes.iter().find(|a| !universe.contains(*a)) {
            return Err(ValidationError::UnknownAttribute {
                attribute: attr.clone(),
                context: format!("relation {}", relation.name),
            });
        }
    }

    Ok(())
}

/// Closure targets must be drawn from the module's universe.
pub fn validate_closure_target(
    module: &FdModuleV1,
    target: &[Name],
) -> Result<(), ValidationError> {
    let universe = module.universe();
    match target.iter().find(|a| !universe.contains(*a)) {
        Some(attr) => Err(ValidationError::UnknownAttribute {
            attribute: attr.clone(),
            context: "closure target".to_string(),
        }),
        None => Ok(()),
    }
}

/// Chase and preservation checks need a decomposition of at least
/// `min_decomposition_relations` relations covering the universe.
pub fn validate_decomposition(
    module: &FdModuleV1,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    if module.relations.len() < limits.min_decomposition_relations {
        return Err(ValidationError::TooFewRelations {
            count: module.relations.len(),
            min: limits.min_decomposition_relations,
        });
    }

    let covered: BTreeSet<&Name> = module
        .relations
        .iter()
        .flat_map(|r| r.attributes.iter())
        .collect();
    let missing: Vec<Name> = module
        .universe()
        .into_iter()
        .filter(|a| !covered.contains(a))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::UncoveredAttributes { missing });
    }
    Ok(())
}

pub fn validate_for_key_search(
    module: &FdModuleV1,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    let attributes = module.universe().len();
    if attributes > limits.key_search_max_attributes {
        return Err(ValidationError::TooManyAttributes {
            count: attributes,
            limit: limits.key_search_max_attributes,
        });
    }
    if module.fds.len() > limits.key_search_max_fds {
        return Err(ValidationError::TooManyFds {
            count: module.fds.len(),
            limit: limits.key_search_max_fds,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd_v1::{parse_fd_module_v1, FdDeclV1};

    #[test]
    fn empty_rhs_is_rejected() {
        let module = FdModuleV1 {
            fds: vec![FdDeclV1 {
                lhs: vec!["A".to_string()],
                rhs: vec![],
            }],
            ..Default::default()
        };
        let err = validate_module(&module, &ValidationLimits::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptySide {
                index: 1,
                side: FdSide::Right
            }
        );
    }

    #[test]
    fn fd_outside_declared_schema_is_rejected() {
        let module = parse_fd_module_v1("schema R(A, B)\nA -> C\n").unwrap();
        let err = validate_module(&module, &ValidationLimits::default()).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownAttribute { ref attribute, .. } if attribute == "C"));
    }

    #[test]
    fn decomposition_must_cover_universe() {
        let module = parse_fd_module_v1("A -> B\nB -> C\nrelation R1(A, B)\nrelation R2(A)\n").unwrap();
        let err = validate_decomposition(&module, &ValidationLimits::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UncoveredAttributes {
                missing: vec!["C".to_string()]
            }
        );
    }

    #[test]
    fn single_relation_decomposition_is_rejected() {
        let module = parse_fd_module_v1("A -> B\nrelation R1(A, B)\n").unwrap();
        let err = validate_decomposition(&module, &ValidationLimits::default()).unwrap_err();
        assert_eq!(err, ValidationError::TooFewRelations { count: 1, min: 2 });
    }

    #[test]
    fn key_search_bound_is_stricter() {
        let attrs: Vec<String> = (0..13).map(|i| format!("a{i}")).collect();
        let text = format!("schema R({})\na0 -> a1\n", attrs.join(", "));
        let module = parse_fd_module_v1(&text).unwrap();
        let limits = ValidationLimits::default();
        assert!(validate_module(&module, &limits).is_ok());
        assert!(matches!(
            validate_for_key_search(&module, &limits),
            Err(ValidationError::TooManyAttributes { count: 13, limit: 12 })
        ));
    }
}
