//! `fd_v1` modules to engine values.
//!
//! Callers are expected to run `relnorm_dsl::validate` first; the checks here
//! only guard the invariants the engine relies on.

use crate::attrs::AttrSet;
use crate::fd::{Decomposition, Fd, RelationSchema};
use anyhow::{anyhow, ensure, Context, Result};
use relnorm_dsl::fd_v1::{parse_fd_list_v1, FdDeclV1, FdModuleV1, Name};

pub fn attr_set(names: &[Name]) -> AttrSet {
    names.iter().cloned().collect()
}

pub fn fd_from_decl(decl: &FdDeclV1) -> Fd {
    Fd::new(attr_set(&decl.lhs), attr_set(&decl.rhs))
}

pub fn schema_from_module(module: &FdModuleV1) -> Result<RelationSchema> {
    let mut fds = Vec::with_capacity(module.fds.len());
    for (i, decl) in module.fds.iter().enumerate() {
        ensure!(
            !decl.lhs.is_empty() && !decl.rhs.is_empty(),
            "fd #{} has an empty side",
            i + 1
        );
        fds.push(fd_from_decl(decl));
    }
    let declared = module
        .schema
        .as_ref()
        .map(|s| attr_set(&s.attributes))
        .unwrap_or_default();
    Ok(RelationSchema::new(declared, fds))
}

/// The module's `relation` lines, in order.
pub fn decomposition_from_module(module: &FdModuleV1) -> Result<Decomposition> {
    if !module.has_decomposition() {
        return Err(anyhow!("module declares no relations"));
    }
    Ok(module
        .relations
        .iter()
        .map(|r| attr_set(&r.attributes))
        .collect())
}

/// Inline FD list (`AB -> C; C -> A`).
pub fn parse_fds(text: &str) -> Result<Vec<Fd>> {
    let decls = parse_fd_list_v1(text).context("failed to parse FD list")?;
    Ok(decls.iter().map(fd_from_decl).collect())
}
