//! Attribute sets.
//!
//! Attributes are opaque names. Sets are kept ordered so that every trace the
//! engine emits is reproducible from run to run.

use serde::{Deserialize, Serialize};
use std::collections::{btree_set, BTreeSet};
use std::fmt;

pub type Attribute = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrSet(BTreeSet<Attribute>);

impl AttrSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// One attribute per non-whitespace character: `AttrSet::letters("ABC")`.
    pub fn letters(text: &str) -> Self {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.0.contains(attr)
    }

    pub fn insert(&mut self, attr: impl Into<Attribute>) -> bool {
        self.0.insert(attr.into())
    }

    pub fn is_subset(&self, other: &AttrSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn is_proper_subset(&self, other: &AttrSet) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }

    pub fn union(&self, other: &AttrSet) -> AttrSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    pub fn intersection(&self, other: &AttrSet) -> AttrSet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn difference(&self, other: &AttrSet) -> AttrSet {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    pub fn without(&self, attr: &str) -> AttrSet {
        let mut out = self.clone();
        out.0.remove(attr);
        out
    }

    /// Add every attribute of `other`, returning the ones that were new.
    pub fn absorb(&mut self, other: &AttrSet) -> AttrSet {
        let added = other.difference(self);
        self.0.extend(added.iter().cloned());
        added
    }

    /// True when every attribute is a single character, so the set can be
    /// written in the compact `ABC` form.
    pub fn is_compact(&self) -> bool {
        self.0.iter().all(|a| a.chars().count() == 1)
    }
}

impl<S: Into<Attribute>> FromIterator<S> for AttrSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for AttrSet {
    type Item = Attribute;
    type IntoIter = btree_set::IntoIter<Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttrSet {
    type Item = &'a Attribute;
    type IntoIter = btree_set::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for AttrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("∅");
        }
        if self.is_compact() {
            for a in &self.0 {
                f.write_str(a)?;
            }
            return Ok(());
        }
        let parts: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
