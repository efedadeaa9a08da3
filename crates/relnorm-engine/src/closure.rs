//! Attribute-set closure `X⁺` under an FD set.

use crate::attrs::AttrSet;
use crate::fd::Fd;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// One FD application that added at least one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureStep {
    /// 1-based pass over the FD set in which the FD fired.
    pub pass: usize,
    /// Index into the FD set the closure was computed over.
    pub fd_index: usize,
    pub fd: Fd,
    pub added: AttrSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureResult {
    pub seed: AttrSet,
    pub closure: AttrSet,
    pub steps: Vec<ClosureStep>,
    /// Passes run, including the final pass that added nothing.
    pub passes: usize,
}

/// Compute `seed⁺` under `fds`, recording every productive FD application.
///
/// Repeats full passes over `fds` until a pass adds nothing. An FD that fires
/// has its whole right side in the result afterwards and never fires again,
/// so there are at most `fds.len() + 1` passes.
///
/// Attributes that no FD mentions are inert: they stay in the result and
/// never trigger anything.
pub fn closure(seed: &AttrSet, fds: &[Fd]) -> ClosureResult {
    let mut result = seed.clone();
    let mut steps = Vec::new();
    let mut passes = 0;

    loop {
        passes += 1;
        let mut changed = false;
        for (fd_index, fd) in fds.iter().enumerate() {
            if !fd.lhs.is_subset(&result) {
                continue;
            }
            let added = result.absorb(&fd.rhs);
            if added.is_empty() {
                continue;
            }
            trace!(pass = passes, fd = %fd, added = %added, "closure step");
            steps.push(ClosureStep {
                pass: passes,
                fd_index,
                fd: fd.clone(),
                added,
            });
            changed = true;
        }
        if !changed {
            break;
        }
    }
    debug_assert!(passes <= fds.len() + 1);

    ClosureResult {
        seed: seed.clone(),
        closure: result,
        steps,
        passes,
    }
}

/// `seed⁺` without the step trace.
pub fn closure_of(seed: &AttrSet, fds: &[Fd]) -> AttrSet {
    let mut result = seed.clone();
    loop {
        let mut changed = false;
        for fd in fds {
            if fd.lhs.is_subset(&result) && !fd.rhs.is_subset(&result) {
                result.absorb(&fd.rhs);
                changed = true;
            }
        }
        if !changed {
            return result;
        }
    }
}
