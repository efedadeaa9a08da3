//! `fd_v1`: functional-dependency modules
//!
//! A module is a sequence of lines:
//!
//! ```text
//! module Enrollment            # optional
//! schema R(A, B, C, D)         # optional declared universe
//! fd AB -> C                   # `fd` keyword optional, `→` accepted
//! C -> A, D
//! relation R1(A, B)            # decomposition members, in order
//! ```
//!
//! Attribute lists are identifiers separated by commas or whitespace. A
//! separator-free run of uppercase ASCII letters (`ABC`) is the textbook
//! shorthand and is read as one attribute per letter; wrap a name in
//! backticks (`` `ID` ``) to keep it whole.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char as pchar, space0, space1},
    combinator::{all_consuming, map, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub type Name = String;

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FdModuleV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDeclV1>,
    pub fds: Vec<FdDeclV1>,
    pub relations: Vec<RelationDeclV1>,
}

/// Declared attribute universe: `schema R(A, B, C)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaDeclV1 {
    pub name: Name,
    pub attributes: Vec<Name>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FdDeclV1 {
    pub lhs: Vec<Name>,
    pub rhs: Vec<Name>,
}

/// One member of a decomposition: `relation R1(A, B)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationDeclV1 {
    pub name: Name,
    pub attributes: Vec<Name>,
}

impl FdModuleV1 {
    /// Every attribute the module mentions: the declared schema plus every
    /// attribute used by an FD.
    pub fn universe(&self) -> BTreeSet<Name> {
        let mut out: BTreeSet<Name> = BTreeSet::new();
        if let Some(schema) = &self.schema {
            out.extend(schema.attributes.iter().cloned());
        }
        for fd in &self.fds {
            out.extend(fd.lhs.iter().cloned());
            out.extend(fd.rhs.iter().cloned());
        }
        out
    }

    pub fn has_decomposition(&self) -> bool {
        !self.relations.is_empty()
    }
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Error)]
pub enum FdV1ParseError {
    #[error("parse error on line {line}: {message}")]
    Line { line: usize, message: String },
}

pub fn parse_fd_module_v1(text: &str) -> Result<FdModuleV1, FdV1ParseError> {
    let mut module = FdModuleV1::default();
    let mut schema_line: Option<usize> = None;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        let err = |message: String| FdV1ParseError::Line {
            line: line_no,
            message,
        };

        if is_fd_line(line) {
            module.fds.push(parse_fd_decl(line).map_err(err)?);
            continue;
        }

        if let Some(rest) = line.strip_prefix("module ").map(str::trim) {
            if module.module_name.is_some() {
                return Err(err("duplicate `module` declaration".to_string()));
            }
            let name = all_consuming(parse_ident)(rest)
                .map(|(_, name)| name.to_string())
                .map_err(|_| err("module expects: `module <Name>`".to_string()))?;
            module.module_name = Some(name);
            continue;
        }

        if line.starts_with("schema ") {
            if let Some(first) = schema_line {
                return Err(err(format!(
                    "duplicate `schema` declaration (first on line {first})"
                )));
            }
            let (name, attributes) = parse_named_attr_decl("schema", line).map_err(err)?;
            module.schema = Some(SchemaDeclV1 { name, attributes });
            schema_line = Some(line_no);
            continue;
        }

        if line.starts_with("relation ") {
            let (name, attributes) = parse_named_attr_decl("relation", line).map_err(err)?;
            module.relations.push(RelationDeclV1 { name, attributes });
            continue;
        }

        return Err(err(format!("unrecognized line: {line}")));
    }

    Ok(module)
}

/// Parse an inline FD list such as `AB -> C; C -> A` (`;` or newlines
/// between FDs). Error line numbers count list items from 1.
pub fn parse_fd_list_v1(text: &str) -> Result<Vec<FdDeclV1>, FdV1ParseError> {
    text.split(|c: char| c == ';' || c == '\n')
        .map(|item| strip_comment(item).trim())
        .filter(|item| !item.is_empty())
        .enumerate()
        .map(|(i, item)| {
            parse_fd_decl(item).map_err(|message| FdV1ParseError::Line {
                line: i + 1,
                message,
            })
        })
        .collect()
}

/// Parse a bare attribute list (`AB`, `emp_id, name`), e.g. a closure target.
pub fn parse_attr_list_v1(text: &str) -> Result<Vec<Name>, String> {
    let trimmed = text.trim();
    all_consuming(attr_list)(trimmed)
        .map(|(_, attrs)| attrs)
        .map_err(|_| format!("invalid attribute list: `{trimmed}`"))
}

/// Cut at the first `#` or `--`, whichever comes first.
fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("--")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

fn is_fd_line(line: &str) -> bool {
    line.contains("->") || line.contains('→')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `name` can be written in `fd_v1` without quoting.
pub fn is_valid_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

fn is_shorthand_run(name: &str) -> bool {
    name.len() > 1 && name.chars().all(|c| c.is_ascii_uppercase())
}

fn parse_ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(is_ident_start),
        take_while(is_ident_continue),
    ))(input)
}

/// One attribute token; the flag says whether the shorthand may split it.
fn attr_item(input: &str) -> IResult<&str, (&str, bool)> {
    alt((
        map(delimited(pchar('`'), parse_ident, pchar('`')), |s| (s, false)),
        map(parse_ident, |s| (s, true)),
    ))(input)
}

fn list_sep(input: &str) -> IResult<&str, ()> {
    alt((
        map(tuple((space0, pchar(','), space0)), |_| ()),
        map(space1, |_| ()),
    ))(input)
}

fn attr_list(input: &str) -> IResult<&str, Vec<Name>> {
    let (input, items) = separated_list1(list_sep, attr_item)(input)?;
    let mut out = Vec::new();
    for (item, splittable) in items {
        if splittable && is_shorthand_run(item) {
            out.extend(item.chars().map(|c| c.to_string()));
        } else {
            out.push(item.to_string());
        }
    }
    Ok((input, out))
}

fn arrow(input: &str) -> IResult<&str, &str> {
    alt((tag("->"), tag("→")))(input)
}

fn parse_fd_decl(line: &str) -> Result<FdDeclV1, String> {
    fn parser(input: &str) -> IResult<&str, FdDeclV1> {
        let (input, _) = opt(pair(tag("fd"), space1))(input)?;
        let (input, lhs) = attr_list(input)?;
        let (input, _) = tuple((space0, arrow, space0))(input)?;
        let (input, rhs) = attr_list(input)?;
        let (input, _) = space0(input)?;
        Ok((input, FdDeclV1 { lhs, rhs }))
    }

    all_consuming(parser)(line.trim())
        .map(|(_, v)| v)
        .map_err(|_| "fd expects: `fd <lhs> -> <rhs>` (attribute lists on both sides)".to_string())
}

fn parse_named_attr_decl(keyword: &str, line: &str) -> Result<(Name, Vec<Name>), String> {
    fn body(input: &str) -> IResult<&str, (Name, Vec<Name>)> {
        let (input, name) = parse_ident(input)?;
        let (input, attrs) = delimited(
            pair(space0, pchar('(')),
            delimited(space0, attr_list, space0),
            pchar(')'),
        )(input)?;
        let (input, _) = space0(input)?;
        Ok((input, (name.to_string(), attrs)))
    }

    let rest = line
        .strip_prefix(keyword)
        .map(str::trim)
        .unwrap_or_default();
    all_consuming(body)(rest)
        .map(|(_, v)| v)
        .map_err(|_| format!("{keyword} expects: `{keyword} <Name>(A, B, ...)`"))
}

// ============================================================================
// Formatter
// ============================================================================

/// Render a module in canonical `fd_v1` form.
///
/// The compact shorthand (`AB -> C`) is used when every attribute is a single
/// uppercase letter; otherwise lists are comma separated and multi-letter
/// uppercase names are backtick-quoted so they survive a re-parse.
pub fn format_fd_module_v1(module: &FdModuleV1) -> Result<String, String> {
    let names = module
        .schema
        .iter()
        .flat_map(|s| s.attributes.iter())
        .chain(module.fds.iter().flat_map(|fd| fd.lhs.iter().chain(&fd.rhs)))
        .chain(module.relations.iter().flat_map(|r| r.attributes.iter()));

    let mut compact = true;
    for name in names {
        if !is_valid_attribute_name(name) {
            return Err(format!("attribute `{name}` is not a valid identifier"));
        }
        compact &= name.len() == 1 && name.chars().all(|c| c.is_ascii_uppercase());
    }

    let mut out = String::new();
    if let Some(name) = &module.module_name {
        out.push_str(&format!("module {name}\n"));
    }
    if let Some(schema) = &module.schema {
        out.push_str(&format!(
            "schema {}({})\n",
            schema.name,
            format_attr_list(&schema.attributes, compact)
        ));
    }
    for fd in &module.fds {
        out.push_str(&format!(
            "fd {} -> {}\n",
            format_attr_list(&fd.lhs, compact),
            format_attr_list(&fd.rhs, compact)
        ));
    }
    for relation in &module.relations {
        out.push_str(&format!(
            "relation {}({})\n",
            relation.name,
            format_attr_list(&relation.attributes, compact)
        ));
    }
    Ok(out)
}

fn format_attr_list(attrs: &[Name], compact: bool) -> String {
    if compact {
        return attrs.concat();
    }
    attrs
        .iter()
        .map(|a| {
            if is_shorthand_run(a) {
                format!("`{a}`")
            } else {
                a.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
