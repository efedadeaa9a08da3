//! Lossless-join test by tableau chase.
//!
//! The tableau has one row per decomposition member and one column per
//! universe attribute. Row `i` holds the distinguished symbol `a_j` in every
//! column its relation contains and a row-local `b_ij` elsewhere. FDs are
//! applied until nothing changes; the join is lossless iff some row ends up
//! made only of distinguished symbols.

use crate::attrs::{AttrSet, Attribute};
use crate::budget::AnalysisBudget;
use crate::fd::{Fd, RelationSchema};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, trace, warn};

/// A tableau cell.
///
/// The derived order puts every distinguished symbol before every local one,
/// and local symbols by row. Unification always picks the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Symbol {
    Distinguished { col: usize },
    Local { row: usize, col: usize },
}

impl Symbol {
    pub fn is_distinguished(&self) -> bool {
        matches!(self, Symbol::Distinguished { .. })
    }
}

/// Indices are shown 1-based: `a1`, `b21`, and `b2_11` once an index has
/// more than one digit.
impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Symbol::Distinguished { col } => write!(f, "a{}", col + 1),
            Symbol::Local { row, col } if row < 9 && col < 9 => {
                write!(f, "b{}{}", row + 1, col + 1)
            }
            Symbol::Local { row, col } => write!(f, "b{}_{}", row + 1, col + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tableau {
    pub columns: Vec<Attribute>,
    pub rows: Vec<Vec<Symbol>>,
}

impl Tableau {
    pub fn initial(universe: &AttrSet, decomposition: &[AttrSet]) -> Self {
        let columns: Vec<Attribute> = universe.iter().cloned().collect();
        let rows = decomposition
            .iter()
            .enumerate()
            .map(|(row, relation)| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(col, attr)| {
                        if relation.contains(attr) {
                            Symbol::Distinguished { col }
                        } else {
                            Symbol::Local { row, col }
                        }
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn column_of(&self, attr: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == attr)
    }

    /// First row made only of distinguished symbols.
    pub fn distinguished_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.iter().all(Symbol::is_distinguished))
    }

    /// Cells as display strings, row by row.
    pub fn render(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }
}

/// One unification: within a group of rows that agree on `fd.lhs`, every
/// symbol in `old_values` was replaced by `new_value` in `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaseStep {
    pub pass: usize,
    pub fd_index: usize,
    pub fd: Fd,
    /// The rows that agree on the FD's left side.
    pub rows: Vec<usize>,
    pub column: usize,
    pub attribute: Attribute,
    pub old_values: Vec<Symbol>,
    pub new_value: Symbol,
    /// `(row, column)` of every rewritten cell.
    pub highlighted: Vec<(usize, usize)>,
    /// Tableau rows after the rewrite.
    pub snapshot: Vec<Vec<Symbol>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaseResult {
    pub is_lossless: bool,
    pub lossless_row: Option<usize>,
    /// Passes ran out while the tableau was still changing. A `false`
    /// verdict is then inconclusive.
    pub hit_iteration_cap: bool,
    pub passes: usize,
    pub initial_tableau: Tableau,
    pub final_tableau: Tableau,
    pub steps: Vec<ChaseStep>,
}

pub fn chase(schema: &RelationSchema, decomposition: &[AttrSet]) -> ChaseResult {
    chase_with_budget(schema, decomposition, &AnalysisBudget::default())
}

pub fn chase_with_budget(
    schema: &RelationSchema,
    decomposition: &[AttrSet],
    budget: &AnalysisBudget,
) -> ChaseResult {
    let initial = Tableau::initial(&schema.universe, decomposition);
    let mut tableau = initial.clone();
    let mut steps = Vec::new();
    let mut passes = 0;
    let mut hit_iteration_cap = false;

    let mut lossless_row = tableau.distinguished_row();
    while lossless_row.is_none() {
        if passes >= budget.max_chase_passes {
            hit_iteration_cap = true;
            warn!(passes, "chase hit iteration cap");
            break;
        }
        passes += 1;

        let mut changed = false;
        for (fd_index, fd) in schema.fds.iter().enumerate() {
            changed |= apply_fd(&mut tableau, passes, fd_index, fd, &mut steps);
        }

        lossless_row = tableau.distinguished_row();
        if !changed {
            break;
        }
    }

    debug!(
        relations = decomposition.len(),
        passes,
        steps = steps.len(),
        lossless = lossless_row.is_some(),
        "chase"
    );

    ChaseResult {
        is_lossless: lossless_row.is_some(),
        lossless_row,
        hit_iteration_cap,
        passes,
        initial_tableau: initial,
        final_tableau: tableau,
        steps,
    }
}

/// Apply one FD to the tableau. Returns whether any cell changed.
///
/// FDs naming an attribute outside the tableau's columns are skipped.
fn apply_fd(
    tableau: &mut Tableau,
    pass: usize,
    fd_index: usize,
    fd: &Fd,
    steps: &mut Vec<ChaseStep>,
) -> bool {
    let Some(lhs_cols) = columns_for(tableau, &fd.lhs) else {
        return false;
    };
    let Some(rhs_cols) = columns_for(tableau, &fd.rhs) else {
        return false;
    };

    let mut groups: BTreeMap<Vec<Symbol>, Vec<usize>> = BTreeMap::new();
    for (i, row) in tableau.rows.iter().enumerate() {
        let projection: Vec<Symbol> = lhs_cols.iter().map(|&c| row[c]).collect();
        groups.entry(projection).or_default().push(i);
    }

    let mut changed = false;
    for rows in groups.into_values().filter(|rows| rows.len() >= 2) {
        for &col in &rhs_cols {
            let values: BTreeSet<Symbol> = rows.iter().map(|&r| tableau.rows[r][col]).collect();
            if values.len() < 2 {
                continue;
            }
            let Some(&new_value) = values.first() else {
                continue;
            };

            // Rewrite every occurrence in the column, not only the group's
            // rows, so equal symbols stay equal.
            let mut highlighted = Vec::new();
            for (r, row) in tableau.rows.iter_mut().enumerate() {
                if row[col] != new_value && values.contains(&row[col]) {
                    row[col] = new_value;
                    highlighted.push((r, col));
                }
            }
            trace!(fd = %fd, column = %tableau.columns[col], to = %new_value, cells = highlighted.len(), "chase unify");

            steps.push(ChaseStep {
                pass,
                fd_index,
                fd: fd.clone(),
                rows: rows.clone(),
                column: col,
                attribute: tableau.columns[col].clone(),
                old_values: values.into_iter().filter(|v| *v != new_value).collect(),
                new_value,
                highlighted,
                snapshot: tableau.rows.clone(),
            });
            changed = true;
        }
    }
    changed
}

fn columns_for(tableau: &Tableau, attrs: &AttrSet) -> Option<Vec<usize>> {
    attrs.iter().map(|a| tableau.column_of(a)).collect()
}
