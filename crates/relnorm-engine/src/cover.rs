//! Minimal cover.
//!
//! The cover is built in a fixed order; each phase is callable on its own and
//! returns its output FD set together with the decisions it made:
//!
//! 1. split right sides into singletons,
//! 2. drop duplicates,
//! 3. left-reduce (remove extraneous LHS attributes), then drop duplicates again,
//! 4. remove FDs derivable from the rest.
//!
//! Reordering the phases can leave extraneous attributes or redundant FDs
//! behind.

use crate::attrs::{AttrSet, Attribute};
use crate::budget::RedundancyCheck;
use crate::closure::closure_of;
use crate::fd::Fd;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Output of one cover phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverPhase<S> {
    pub fds: Vec<Fd>,
    pub steps: Vec<S>,
}

/// An FD with a multi-attribute right side and the singleton FDs replacing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStep {
    pub original: Fd,
    pub produced: Vec<Fd>,
}

/// A dropped repeat of an FD that appears earlier in the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateStep {
    pub fd: Fd,
    /// Position of the dropped copy in the phase input.
    pub index: usize,
    /// Position of the copy that was kept.
    pub kept_index: usize,
}

/// One "is this LHS attribute extraneous?" test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LhsTestStep {
    pub fd_index: usize,
    /// The FD as it stood when the attribute was tested.
    pub fd: Fd,
    pub attribute: Attribute,
    /// Closure of the LHS without `attribute`, over the working set.
    pub closure: AttrSet,
    pub extraneous: bool,
}

/// One "is this FD derivable from the others?" test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedundancyStep {
    pub fd: Fd,
    /// Closure of the FD's LHS over every other FD still in the set.
    pub closure_without: AttrSet,
    pub redundant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalCover {
    pub fds: Vec<Fd>,
    pub split: Vec<SplitStep>,
    pub duplicates: Vec<DuplicateStep>,
    pub lhs_tests: Vec<LhsTestStep>,
    pub redundancy: Vec<RedundancyStep>,
}

pub fn split_rhs(fds: &[Fd]) -> CoverPhase<SplitStep> {
    let mut out = Vec::with_capacity(fds.len());
    let mut steps = Vec::new();
    for fd in fds {
        if fd.rhs.len() <= 1 {
            out.push(fd.clone());
            continue;
        }
        let produced: Vec<Fd> = fd
            .rhs
            .iter()
            .map(|a| Fd::new(fd.lhs.clone(), std::iter::once(a.clone()).collect()))
            .collect();
        out.extend(produced.iter().cloned());
        steps.push(SplitStep {
            original: fd.clone(),
            produced,
        });
    }
    CoverPhase { fds: out, steps }
}

/// Keep the first occurrence of every FD.
pub fn remove_duplicates(fds: &[Fd]) -> CoverPhase<DuplicateStep> {
    let mut out: Vec<Fd> = Vec::with_capacity(fds.len());
    let mut kept_at: Vec<usize> = Vec::with_capacity(fds.len());
    let mut steps = Vec::new();
    for (index, fd) in fds.iter().enumerate() {
        match out.iter().position(|f| f == fd) {
            Some(pos) => steps.push(DuplicateStep {
                fd: fd.clone(),
                index,
                kept_index: kept_at[pos],
            }),
            None => {
                out.push(fd.clone());
                kept_at.push(index);
            }
        }
    }
    CoverPhase { fds: out, steps }
}

/// Left-reduce every FD in order.
///
/// An attribute `a` of `X -> Y` is extraneous when `Y ⊆ (X - a)⁺` over the
/// current working set. The working set includes the FD under test (with its
/// current, partially reduced LHS); reductions are applied immediately so
/// later tests see them. A LHS is never reduced to empty.
///
/// Duplicates created by reduction are left in place; see [`minimal_cover`].
pub fn minimize_lhs(fds: &[Fd]) -> CoverPhase<LhsTestStep> {
    let mut working = fds.to_vec();
    let mut steps = Vec::new();

    for fd_index in 0..working.len() {
        let attrs: Vec<Attribute> = working[fd_index].lhs.iter().cloned().collect();
        for attribute in attrs {
            let current = working[fd_index].clone();
            if current.lhs.len() <= 1 {
                break;
            }
            let reduced = current.lhs.without(&attribute);
            let closure = closure_of(&reduced, &working);
            let extraneous = current.rhs.is_subset(&closure);
            trace!(fd = %current, attribute = %attribute, extraneous, "lhs test");
            if extraneous {
                working[fd_index] = Fd::new(reduced, current.rhs.clone());
            }
            steps.push(LhsTestStep {
                fd_index,
                fd: current,
                attribute,
                closure,
                extraneous,
            });
        }
    }

    CoverPhase {
        fds: working,
        steps,
    }
}

/// Drop FDs whose right side is in the closure of their left side over the
/// remaining FDs. Removals take effect immediately, so of two FDs that
/// derive each other only the first is dropped.
pub fn remove_redundant(fds: &[Fd], check: RedundancyCheck) -> CoverPhase<RedundancyStep> {
    let mut kept = fds.to_vec();
    let mut steps = Vec::new();
    let mut index = 0;

    while index < kept.len() {
        let fd = kept[index].clone();
        if check == RedundancyCheck::RhsCollision
            && !kept
                .iter()
                .enumerate()
                .any(|(j, other)| j != index && other.rhs == fd.rhs)
        {
            index += 1;
            continue;
        }

        let others: Vec<Fd> = kept
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, other)| other.clone())
            .collect();
        let closure_without = closure_of(&fd.lhs, &others);
        let redundant = fd.rhs.is_subset(&closure_without);
        trace!(fd = %fd, redundant, "redundancy test");

        if redundant {
            kept.remove(index);
        } else {
            index += 1;
        }
        steps.push(RedundancyStep {
            fd,
            closure_without,
            redundant,
        });
    }

    CoverPhase { fds: kept, steps }
}

pub fn minimal_cover(fds: &[Fd]) -> MinimalCover {
    minimal_cover_with(fds, RedundancyCheck::default())
}

pub fn minimal_cover_with(fds: &[Fd], check: RedundancyCheck) -> MinimalCover {
    let split = split_rhs(fds);
    let deduped = remove_duplicates(&split.fds);
    let reduced = minimize_lhs(&deduped.fds);
    let deduped_again = remove_duplicates(&reduced.fds);
    let pruned = remove_redundant(&deduped_again.fds, check);

    debug!(
        input = fds.len(),
        split = split.fds.len(),
        output = pruned.fds.len(),
        "minimal cover"
    );

    let mut duplicates = deduped.steps;
    duplicates.extend(deduped_again.steps);

    MinimalCover {
        fds: pruned.fds,
        split: split.steps,
        duplicates,
        lhs_tests: reduced.steps,
        redundancy: pruned.steps,
    }
}
