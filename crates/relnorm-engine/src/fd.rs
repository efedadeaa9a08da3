//! Functional dependencies and relation schemas.

use crate::attrs::AttrSet;
use crate::closure::closure_of;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `lhs -> rhs`. Equality is set equality on both sides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fd {
    pub lhs: AttrSet,
    pub rhs: AttrSet,
}

impl Fd {
    pub fn new(lhs: AttrSet, rhs: AttrSet) -> Self {
        Self { lhs, rhs }
    }

    /// `Fd::letters("AB", "C")` is `AB -> C`.
    pub fn letters(lhs: &str, rhs: &str) -> Self {
        Self::new(AttrSet::letters(lhs), AttrSet::letters(rhs))
    }

    pub fn is_trivial(&self) -> bool {
        self.rhs.is_subset(&self.lhs)
    }

    pub fn attributes(&self) -> AttrSet {
        self.lhs.union(&self.rhs)
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs)
    }
}

/// A relation schema: its attribute universe plus the FDs that hold on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub universe: AttrSet,
    pub fds: Vec<Fd>,
}

impl RelationSchema {
    /// The universe is `attributes` plus every attribute an FD mentions.
    pub fn new(attributes: AttrSet, fds: Vec<Fd>) -> Self {
        let mut universe = attributes;
        for fd in &fds {
            universe.absorb(&fd.lhs);
            universe.absorb(&fd.rhs);
        }
        Self { universe, fds }
    }

    pub fn from_fds(fds: Vec<Fd>) -> Self {
        Self::new(AttrSet::new(), fds)
    }

    pub fn closure_of(&self, attrs: &AttrSet) -> AttrSet {
        closure_of(attrs, &self.fds)
    }

    pub fn is_superkey(&self, attrs: &AttrSet) -> bool {
        self.universe.is_subset(&self.closure_of(attrs))
    }
}

/// Ordered list of relation schemas, each given by its attributes.
pub type Decomposition = Vec<AttrSet>;

/// Whether `fds` logically implies `fd`.
pub fn implies(fds: &[Fd], fd: &Fd) -> bool {
    fd.rhs.is_subset(&closure_of(&fd.lhs, fds))
}

/// Two FD sets are equivalent when each implies every FD of the other.
pub fn equivalent(f: &[Fd], g: &[Fd]) -> bool {
    g.iter().all(|fd| implies(f, fd)) && f.iter().all(|fd| implies(g, fd))
}
