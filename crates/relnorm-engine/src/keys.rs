//! Candidate keys.
//!
//! Keys are found by a level-wise search over combinations of left-hand-side
//! attributes. Every node of the search is kept in a flat arena so the whole
//! tree can be serialized and rendered as an explanation.
//!
//! Search shape:
//! - the root is the set of attributes no FD mentions (they belong to every key),
//! - level 1 adds one LHS attribute to the root,
//! - a non-key node is expanded by joining it with each later non-key sibling,
//! - a node whose closure is the universe is a key and is not expanded,
//! - a node containing an already found key is a superkey and is pruned.
//!
//! Attributes that appear only on right-hand sides are never part of a
//! minimal key, so they are never added.

use crate::attrs::AttrSet;
use crate::budget::AnalysisBudget;
use crate::closure::closure_of;
use crate::fd::RelationSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, trace, warn};

// ============================================================================
// Attribute classes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeClass {
    /// Appears only on left-hand sides.
    L,
    /// Appears only on right-hand sides.
    R,
    /// Appears on both sides.
    LR,
    /// Appears in no FD.
    N,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeClasses {
    pub left: AttrSet,
    pub right: AttrSet,
    pub both: AttrSet,
    pub neither: AttrSet,
}

impl AttributeClasses {
    pub fn class_of(&self, attr: &str) -> Option<AttributeClass> {
        if self.left.contains(attr) {
            Some(AttributeClass::L)
        } else if self.right.contains(attr) {
            Some(AttributeClass::R)
        } else if self.both.contains(attr) {
            Some(AttributeClass::LR)
        } else if self.neither.contains(attr) {
            Some(AttributeClass::N)
        } else {
            None
        }
    }

    /// `L ∪ N`: attributes every candidate key must contain.
    pub fn core(&self) -> AttrSet {
        self.left.union(&self.neither)
    }

    /// Attributes that may appear in a candidate key.
    pub fn key_material(&self) -> AttrSet {
        self.left.union(&self.both)
    }
}

pub fn classify_attributes(schema: &RelationSchema) -> AttributeClasses {
    let mut on_left = AttrSet::new();
    let mut on_right = AttrSet::new();
    for fd in &schema.fds {
        on_left.absorb(&fd.lhs);
        on_right.absorb(&fd.rhs);
    }
    AttributeClasses {
        left: on_left.difference(&on_right),
        right: on_right.difference(&on_left),
        both: on_left.intersection(&on_right),
        neither: schema.universe.difference(&on_left.union(&on_right)),
    }
}

// ============================================================================
// Search tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// The root, when it is not itself a key.
    Root,
    /// Not a superkey; its sibling joins were generated.
    Expanded,
    /// A candidate key.
    Key,
    /// Contains a key found earlier; pruned.
    Superkey,
    /// Not a superkey, but the node cap was reached before it was expanded.
    Capped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyNode {
    pub id: usize,
    pub parent_id: Option<usize>,
    pub level: usize,
    pub attributes: AttrSet,
    pub closure: AttrSet,
    pub status: NodeStatus,
    /// `status == Key`; a node's key status is fixed when it is created.
    pub is_key: bool,
}

impl KeyNode {
    fn is_prunable(&self) -> bool {
        matches!(self.status, NodeStatus::Key | NodeStatus::Superkey)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySearch {
    /// Candidate keys in discovery order (smallest first).
    pub keys: Vec<AttrSet>,
    pub tree: Vec<KeyNode>,
    /// The search stopped at `max_key_nodes`; `keys` may be incomplete.
    pub hit_node_cap: bool,
}

impl KeySearch {
    pub fn prime_attributes(&self) -> AttrSet {
        prime_attributes(&self.keys)
    }

    pub fn children(&self, id: usize) -> impl Iterator<Item = &KeyNode> {
        self.tree.iter().filter(move |n| n.parent_id == Some(id))
    }
}

/// Union of all candidate keys.
pub fn prime_attributes(keys: &[AttrSet]) -> AttrSet {
    keys.iter().fold(AttrSet::new(), |acc, k| acc.union(k))
}

pub fn is_superkey(attrs: &AttrSet, schema: &RelationSchema) -> bool {
    schema.is_superkey(attrs)
}

pub fn candidate_keys(schema: &RelationSchema) -> KeySearch {
    candidate_keys_with_budget(schema, &AnalysisBudget::default())
}

pub fn candidate_keys_with_budget(schema: &RelationSchema, budget: &AnalysisBudget) -> KeySearch {
    let mut search = TreeBuilder {
        schema,
        cap: budget.max_key_nodes.max(1),
        tree: Vec::new(),
        keys: Vec::new(),
        seen: BTreeSet::new(),
        hit_node_cap: false,
    };

    let classes = classify_attributes(schema);
    let root = search.push(None, 0, classes.neither.clone());
    if let Some(root) = root {
        if search.tree[root].status != NodeStatus::Key {
            search.tree[root].status = NodeStatus::Root;
            search.expand_root(root, &classes.key_material());
        }
    }

    debug!(
        attributes = schema.universe.len(),
        nodes = search.tree.len(),
        keys = search.keys.len(),
        "candidate key search"
    );
    if search.hit_node_cap {
        warn!(cap = search.cap, "candidate key search hit node cap");
    }

    KeySearch {
        keys: search.keys,
        tree: search.tree,
        hit_node_cap: search.hit_node_cap,
    }
}

struct TreeBuilder<'a> {
    schema: &'a RelationSchema,
    cap: usize,
    tree: Vec<KeyNode>,
    keys: Vec<AttrSet>,
    seen: BTreeSet<AttrSet>,
    hit_node_cap: bool,
}

impl TreeBuilder<'_> {
    /// Add a node, classifying it on the way in. Returns `None` when the set
    /// was already visited or the node cap is reached.
    fn push(&mut self, parent_id: Option<usize>, level: usize, attributes: AttrSet) -> Option<usize> {
        if self.seen.contains(&attributes) {
            return None;
        }
        if self.tree.len() >= self.cap {
            self.hit_node_cap = true;
            return None;
        }

        let closure = closure_of(&attributes, &self.schema.fds);
        let status = if self.keys.iter().any(|k| k.is_subset(&attributes)) {
            NodeStatus::Superkey
        } else if self.schema.universe.is_subset(&closure) {
            self.keys.push(attributes.clone());
            NodeStatus::Key
        } else {
            NodeStatus::Capped
        };
        trace!(level, attributes = %attributes, ?status, "key node");

        let id = self.tree.len();
        self.seen.insert(attributes.clone());
        self.tree.push(KeyNode {
            id,
            parent_id,
            level,
            attributes,
            closure,
            is_key: status == NodeStatus::Key,
            status,
        });
        Some(id)
    }

    fn expand_root(&mut self, root: usize, material: &AttrSet) {
        let base = self.tree[root].attributes.clone();
        let mut frontier = VecDeque::new();
        for attr in material {
            if self.hit_node_cap {
                return;
            }
            let mut attrs = base.clone();
            attrs.insert(attr.clone());
            if let Some(id) = self.push(Some(root), 1, attrs) {
                frontier.push_back(id);
            }
        }

        // Children are always created after every node of the parent's level,
        // so the queue visits the tree level by level and keys come out
        // smallest first.
        while let Some(id) = frontier.pop_front() {
            if self.hit_node_cap {
                return;
            }
            if self.tree[id].status != NodeStatus::Capped {
                continue;
            }
            let Some(parent) = self.tree[id].parent_id else {
                continue;
            };
            let level = self.tree[id].level + 1;
            let siblings: Vec<usize> = self
                .tree
                .iter()
                .filter(|n| n.parent_id == Some(parent) && n.id > id && !n.is_prunable())
                .map(|n| n.id)
                .collect();
            for sibling in siblings {
                let attrs = self.tree[id].attributes.union(&self.tree[sibling].attributes);
                if let Some(child) = self.push(Some(id), level, attrs) {
                    frontier.push_back(child);
                }
                if self.hit_node_cap {
                    return;
                }
            }
            self.tree[id].status = NodeStatus::Expanded;
        }
    }
}

/// A candidate key without a search: `L ∪ N` when it determines the
/// universe, otherwise the universe reduced attribute by attribute.
pub fn fallback_key(schema: &RelationSchema) -> AttrSet {
    let core = classify_attributes(schema).core();
    if schema.is_superkey(&core) {
        core
    } else {
        reduce_to_key(&schema.universe, schema)
    }
}

/// Shrink a superkey to a candidate key by dropping attributes in order
/// while the rest still determines the universe.
pub fn reduce_to_key(superkey: &AttrSet, schema: &RelationSchema) -> AttrSet {
    let mut key = superkey.clone();
    for attr in superkey {
        let smaller = key.without(attr);
        if schema.is_superkey(&smaller) {
            key = smaller;
        }
    }
    key
}
