//! Text explanations of engine results.
//!
//! Every renderer returns the whole report as a `String`; the caller decides
//! whether it goes to stdout or to `--out`.

use anyhow::Result;
use colored::Colorize;
use relnorm_engine::analysis::{DecompositionReport, SchemaAnalysis};
use relnorm_engine::chase::{ChaseResult, Tableau};
use relnorm_engine::closure::ClosureResult;
use relnorm_engine::cover::MinimalCover;
use relnorm_engine::fd::Fd;
use relnorm_engine::keys::{AttributeClasses, KeySearch, NodeStatus};
use relnorm_engine::normal_form::{NormalForm, NormalFormReport, ViolationKind};
use relnorm_engine::preservation::PreservationReport;
use relnorm_engine::synthesis::{RelationOrigin, Synthesis};
use std::fmt::Write;

fn fd_list(fds: &[Fd]) -> String {
    if fds.is_empty() {
        return "(none)".to_string();
    }
    fds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn verdict(ok: bool, yes: &str, no: &str) -> String {
    if ok {
        yes.green().bold().to_string()
    } else {
        no.red().bold().to_string()
    }
}

fn cap_warning(out: &mut String, what: &str) -> Result<()> {
    writeln!(
        out,
        "{} {what} hit its cap; the negative parts of this result are inconclusive",
        "warning:".yellow().bold()
    )?;
    Ok(())
}

pub fn closure(result: &ClosureResult) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "{}⁺ = {}",
        result.seed.to_string().bold(),
        result.closure.to_string().cyan()
    )?;
    for step in &result.steps {
        writeln!(
            out,
            "  pass {}: {} adds {}",
            step.pass,
            step.fd,
            step.added.to_string().green()
        )?;
    }
    Ok(out)
}

pub fn cover(cover: &MinimalCover) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", "Split right-hand sides".bold())?;
    if cover.split.is_empty() {
        writeln!(out, "  nothing to split")?;
    }
    for step in &cover.split {
        writeln!(out, "  {} => {}", step.original, fd_list(&step.produced))?;
    }

    writeln!(out, "{}", "Remove duplicates".bold())?;
    if cover.duplicates.is_empty() {
        writeln!(out, "  no duplicates")?;
    }
    for step in &cover.duplicates {
        writeln!(out, "  drop {} (repeat of #{})", step.fd, step.kept_index + 1)?;
    }

    writeln!(out, "{}", "Minimize left-hand sides".bold())?;
    for step in &cover.lhs_tests {
        let mark = if step.extraneous {
            "extraneous".yellow().to_string()
        } else {
            "needed".normal().to_string()
        };
        writeln!(
            out,
            "  {}: drop {} -> ({})⁺ = {}  {mark}",
            step.fd,
            step.attribute,
            step.fd.lhs.without(&step.attribute),
            step.closure
        )?;
    }

    writeln!(out, "{}", "Remove redundant FDs".bold())?;
    for step in &cover.redundancy {
        let mark = if step.redundant {
            "redundant".yellow().to_string()
        } else {
            "kept".normal().to_string()
        };
        writeln!(
            out,
            "  {}: ({})⁺ without it = {}  {mark}",
            step.fd, step.fd.lhs, step.closure_without
        )?;
    }

    writeln!(out, "{} {}", "Minimal cover:".green().bold(), fd_list(&cover.fds))?;
    Ok(out)
}

pub fn keys(search: &KeySearch) -> Result<String> {
    let mut out = String::new();
    for node in &search.tree {
        let label = match node.status {
            NodeStatus::Key => "key".green().bold().to_string(),
            NodeStatus::Superkey => "superkey, pruned".dimmed().to_string(),
            NodeStatus::Capped => "not expanded".yellow().to_string(),
            NodeStatus::Root => "root".normal().to_string(),
            NodeStatus::Expanded => String::new(),
        };
        writeln!(
            out,
            "{}{}  ⁺ = {}  {label}",
            "  ".repeat(node.level),
            node.attributes,
            node.closure
        )?;
    }
    let keys: Vec<String> = search.keys.iter().map(ToString::to_string).collect();
    writeln!(out, "{} {}", "Candidate keys:".green().bold(), keys.join(", "))?;
    writeln!(out, "Prime attributes: {}", search.prime_attributes())?;
    if search.hit_node_cap {
        cap_warning(&mut out, "candidate key search")?;
    }
    Ok(out)
}

pub fn normal_form(report: &NormalFormReport) -> Result<String> {
    let mut out = String::new();
    normal_form_lines(&mut out, report)?;
    if report.hit_node_cap {
        cap_warning(&mut out, "candidate key search")?;
    }
    Ok(out)
}

fn normal_form_lines(out: &mut String, report: &NormalFormReport) -> Result<()> {
    let level = report.level.to_string();
    let level = if report.level == NormalForm::Bcnf {
        level.green().bold()
    } else {
        level.yellow().bold()
    };
    writeln!(out, "Normal form: {level}")?;
    if let Some(violation) = &report.violation {
        let why = match violation.kind {
            ViolationKind::PartialDependency => "partial dependency",
            ViolationKind::TransitiveDependency => "transitive dependency",
            ViolationKind::NonSuperkeyDeterminant => "determinant is not a superkey",
        };
        write!(out, "  {}: {why}", violation.fd)?;
        if let Some(key) = &violation.key {
            write!(out, " on key {key}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn tableau(out: &mut String, t: &Tableau) -> Result<()> {
    writeln!(out, "      {}", t.columns.iter().map(|c| format!("{c:>5}")).collect::<String>())?;
    for (i, row) in t.render().iter().enumerate() {
        let cells: String = row.iter().map(|c| format!("{c:>5}")).collect();
        writeln!(out, "  R{:<3}{cells}", i + 1)?;
    }
    Ok(())
}

pub fn chase(result: &ChaseResult) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", "Initial tableau".bold())?;
    tableau(&mut out, &result.initial_tableau)?;
    for step in &result.steps {
        let old: Vec<String> = step.old_values.iter().map(ToString::to_string).collect();
        let rows: Vec<String> = step.rows.iter().map(|r| format!("R{}", r + 1)).collect();
        writeln!(
            out,
            "  pass {}: {} on {}: {} {} -> {}",
            step.pass,
            step.fd,
            rows.join(","),
            step.attribute,
            old.join(","),
            step.new_value.to_string().green()
        )?;
    }
    writeln!(out, "{}", "Final tableau".bold())?;
    tableau(&mut out, &result.final_tableau)?;
    let detail = match result.lossless_row {
        Some(row) => format!(" (row R{} is all distinguished)", row + 1),
        None => String::new(),
    };
    writeln!(
        out,
        "Join: {}{detail}",
        verdict(result.is_lossless, "lossless", "lossy")
    )?;
    if result.hit_iteration_cap {
        cap_warning(&mut out, "the chase")?;
    }
    Ok(out)
}

pub fn preservation(report: &PreservationReport) -> Result<String> {
    let mut out = String::new();
    for p in &report.per_fd {
        let how = match p.trivial_relation {
            Some(i) => format!("inside R{}", i + 1),
            None => format!("Z = {} after {} pass(es)", p.final_z, p.passes),
        };
        writeln!(
            out,
            "  {}: {}  {how}",
            p.fd,
            verdict(p.preserved, "preserved", "lost")
        )?;
    }
    writeln!(
        out,
        "Dependencies: {}",
        verdict(report.all_preserved, "all preserved", "not preserved")
    )?;
    if report.hit_iteration_cap {
        cap_warning(&mut out, "Algorithm Z")?;
    }
    Ok(out)
}

fn classes(out: &mut String, classes: &AttributeClasses) -> Result<()> {
    writeln!(
        out,
        "Attribute classes: L = {}, R = {}, LR = {}, N = {}",
        classes.left, classes.right, classes.both, classes.neither
    )?;
    Ok(())
}

pub fn synthesis(s: &Synthesis) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Minimal cover: {}", fd_list(&s.cover.fds))?;
    classes(&mut out, &s.classes)?;
    match &s.fast_path_key {
        Some(key) => writeln!(out, "(L ∪ N)⁺ = {}: {key} is the only key", s.fast_path_closure)?,
        None => writeln!(out, "(L ∪ N)⁺ = {}", s.fast_path_closure)?,
    }
    for dropped in &s.dropped_subsumed {
        writeln!(out, "  drop {} (contained in another relation)", dropped.attributes)?;
    }
    writeln!(out, "{}", "3NF decomposition".bold())?;
    for (i, rel) in s.relations.iter().enumerate() {
        let origin = match &rel.origin {
            RelationOrigin::FdGroup { fds, .. } => fd_list(fds),
            RelationOrigin::CandidateKey { key } => format!("candidate key {key}"),
        };
        writeln!(out, "  R{}({})  from {origin}", i + 1, rel.attributes.to_string().cyan())?;
    }
    if s.keys.hit_node_cap {
        cap_warning(&mut out, "candidate key search")?;
    }
    Ok(out)
}

fn decomposition(out: &mut String, report: &DecompositionReport) -> Result<()> {
    let relations: Vec<String> = report.relations.iter().map(ToString::to_string).collect();
    writeln!(out, "{} {}", "Decomposition".bold(), relations.join(", "))?;
    writeln!(
        out,
        "  join: {}",
        verdict(report.chase.is_lossless, "lossless", "lossy")
    )?;
    writeln!(
        out,
        "  dependencies: {}",
        verdict(report.preservation.all_preserved, "all preserved", "not preserved")
    )?;
    for fd in report.preservation.lost() {
        writeln!(out, "    lost {fd}")?;
    }
    Ok(())
}

pub fn analysis(a: &SchemaAnalysis) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Universe: {}", a.universe.to_string().bold())?;
    writeln!(out, "FDs: {}", fd_list(&a.fds))?;
    writeln!(out, "Minimal cover: {}", fd_list(&a.cover.fds))?;
    let keys: Vec<String> = a.keys.keys.iter().map(ToString::to_string).collect();
    writeln!(out, "Candidate keys: {}", keys.join(", "))?;
    writeln!(out, "Prime attributes: {}", a.prime)?;
    classes(&mut out, &a.classes)?;
    normal_form_lines(&mut out, &a.normal_form)?;
    let relations: Vec<String> = a
        .synthesis
        .relations
        .iter()
        .map(|r| r.attributes.to_string())
        .collect();
    writeln!(out, "3NF synthesis: {}", relations.join(", "))?;
    if let Some(report) = &a.decomposition {
        decomposition(&mut out, report)?;
    }
    if a.hit_any_cap() {
        cap_warning(&mut out, "part of the analysis")?;
    }
    Ok(out)
}
