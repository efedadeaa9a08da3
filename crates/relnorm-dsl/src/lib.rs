//! Relnorm `fd_v1` text syntax
//!
//! This crate defines the line-oriented surface syntax used to describe a
//! relation schema, its functional dependencies and (optionally) a
//! decomposition, plus the caller-side validation contract that runs before
//! any analysis.
//!
//! The analysis engine never sees raw text: callers parse with [`fd_v1`],
//! check the result with [`validate`], and only then hand the module to the
//! engine's import layer.

pub mod fd_v1;
pub mod validate;
