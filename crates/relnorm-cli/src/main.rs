//! Relnorm CLI
//!
//! Functional-dependency analysis from the command line:
//! - Checking and formatting `fd_v1` modules
//! - Attribute closure, minimal cover, candidate keys, normal form
//! - Lossless-join (chase) and dependency-preservation checks for a decomposition
//! - 3NF synthesis

use anyhow::{anyhow, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use relnorm_dsl::fd_v1::{format_fd_module_v1, parse_attr_list_v1, Name};
use relnorm_dsl::validate::validate_closure_target;
use relnorm_engine::budget::{AnalysisBudget, RedundancyCheck};
use relnorm_engine::import::{attr_set, decomposition_from_module, schema_from_module};
use relnorm_engine::normal_form::normal_form_with_budget;
use relnorm_engine::{
    analyze_with_budget, candidate_keys_with_budget, chase_with_budget,
    check_preservation_with_budget, closure, minimal_cover_with, synthesize_3nf_with_budget,
};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod input;
mod render;

use input::{InputArgs, Requirements};

#[derive(Parser)]
#[command(name = "relnorm")]
#[command(
    author,
    version,
    about = "Relnorm: functional dependencies, keys and normalization"
)]
struct Cli {
    /// More logging on stderr (-v debug, -vv trace). `RELNORM_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a module, then print a short summary.
    Check {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the canonical `fd_v1` text of a module.
    Fmt {
        #[command(flatten)]
        input: InputArgs,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Attribute closure X⁺, with the FD firing trace.
    Closure {
        #[command(flatten)]
        input: InputArgs,
        /// Attributes to close, e.g. "AB" or "StudentId, Course"
        #[arg(long = "of")]
        of: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Minimal cover, phase by phase.
    Cover {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Candidate keys and the search tree that found them.
    Keys {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Highest normal form (1NF..BCNF) and the FD that blocks the next one.
    NormalForm {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Lossless-join test of the module's relations (chase).
    Chase {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Dependency-preservation test of the module's relations (Algorithm Z).
    Preserve {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// 3NF synthesis from the minimal cover.
    Synthesize {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Everything above that applies to the module.
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Print the full result (with traces) as JSON
    #[arg(long)]
    json: bool,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct BudgetArgs {
    #[arg(long, default_value_t = AnalysisBudget::default().max_chase_passes)]
    max_chase_passes: usize,
    #[arg(long, default_value_t = AnalysisBudget::default().max_preservation_passes)]
    max_preservation_passes: usize,
    #[arg(long, default_value_t = AnalysisBudget::default().max_key_nodes)]
    max_key_nodes: usize,
    /// Which FDs the redundant-FD pass re-checks
    #[arg(long, value_enum, default_value_t = RedundancyArg::All)]
    redundancy: RedundancyArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RedundancyArg {
    All,
    RhsCollision,
}

impl BudgetArgs {
    fn budget(&self) -> AnalysisBudget {
        let check = match self.redundancy {
            RedundancyArg::All => RedundancyCheck::AllFds,
            RedundancyArg::RhsCollision => RedundancyCheck::RhsCollision,
        };
        AnalysisBudget {
            max_chase_passes: self.max_chase_passes,
            max_preservation_passes: self.max_preservation_passes,
            max_key_nodes: self.max_key_nodes,
            redundancy_check: check,
        }
    }
}

#[derive(Serialize)]
struct CheckSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    module_name: Option<Name>,
    attributes: Vec<Name>,
    fds: usize,
    relations: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { input, output } => cmd_check(&input, &output),
        Commands::Fmt { input, out } => cmd_fmt(&input, out.as_ref()),
        Commands::Closure { input, of, output } => cmd_closure(&input, &of, &output),
        Commands::Cover {
            input,
            budget,
            output,
        } => {
            let module = input.load_validated(Requirements::default())?;
            let schema = schema_from_module(&module)?;
            let cover = minimal_cover_with(&schema.fds, budget.budget().redundancy_check);
            emit(&output, &cover, render::cover)
        }
        Commands::Keys {
            input,
            budget,
            output,
        } => {
            let module = input.load_validated(Requirements {
                key_search: true,
                ..Requirements::default()
            })?;
            let schema = schema_from_module(&module)?;
            let search = candidate_keys_with_budget(&schema, &budget.budget());
            emit(&output, &search, render::keys)
        }
        Commands::NormalForm {
            input,
            budget,
            output,
        } => {
            let module = input.load_validated(Requirements {
                key_search: true,
                ..Requirements::default()
            })?;
            let schema = schema_from_module(&module)?;
            let report = normal_form_with_budget(&schema, &budget.budget());
            emit(&output, &report, render::normal_form)
        }
        Commands::Chase {
            input,
            budget,
            output,
        } => {
            let module = input.load_validated(Requirements {
                decomposition: true,
                ..Requirements::default()
            })?;
            let schema = schema_from_module(&module)?;
            let rho = decomposition_from_module(&module)?;
            let result = chase_with_budget(&schema, &rho, &budget.budget());
            emit(&output, &result, render::chase)
        }
        Commands::Preserve {
            input,
            budget,
            output,
        } => {
            let module = input.load_validated(Requirements {
                decomposition: true,
                ..Requirements::default()
            })?;
            let schema = schema_from_module(&module)?;
            let rho = decomposition_from_module(&module)?;
            let report = check_preservation_with_budget(&schema, &rho, &budget.budget());
            emit(&output, &report, render::preservation)
        }
        Commands::Synthesize {
            input,
            budget,
            output,
        } => {
            let module = input.load_validated(Requirements {
                key_search: true,
                ..Requirements::default()
            })?;
            let schema = schema_from_module(&module)?;
            let synthesis = synthesize_3nf_with_budget(&schema, &budget.budget());
            emit(&output, &synthesis, render::synthesis)
        }
        Commands::Analyze {
            input,
            budget,
            output,
        } => cmd_analyze(&input, &budget, &output),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("RELNORM_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Print `value` as JSON or through `text`, to stdout or `--out`.
fn emit<T: Serialize>(
    output: &OutputArgs,
    value: &T,
    text: impl FnOnce(&T) -> Result<String>,
) -> Result<()> {
    let rendered = if output.json {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        json
    } else {
        text(value)?
    };
    write_output(output.out.as_ref(), &rendered)
}

fn write_output(out: Option<&PathBuf>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text)
                .map_err(|e| anyhow!("failed to write `{}`: {e}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn cmd_check(input: &InputArgs, output: &OutputArgs) -> Result<()> {
    let module = input.load_validated(Requirements::default())?;
    let summary = CheckSummary {
        module_name: module.module_name.clone(),
        attributes: module.universe().into_iter().collect(),
        fds: module.fds.len(),
        relations: module.relations.len(),
    };
    emit(output, &summary, |s| {
        Ok(format!(
            "{} {} attribute(s), {} FD(s), {} relation(s)\n",
            "ok".green().bold(),
            s.attributes.len(),
            s.fds,
            s.relations
        ))
    })
}

fn cmd_fmt(input: &InputArgs, out: Option<&PathBuf>) -> Result<()> {
    let module = input.load()?;
    let text = format_fd_module_v1(&module).map_err(|e| anyhow!("failed to format module: {e}"))?;
    write_output(out, &text)
}

fn cmd_closure(input: &InputArgs, of: &str, output: &OutputArgs) -> Result<()> {
    let module = input.load_validated(Requirements::default())?;
    let target = parse_attr_list_v1(of).map_err(|e| anyhow!("--of: {e}"))?;
    validate_closure_target(&module, &target).map_err(|e| anyhow!("invalid input: {e}"))?;
    let schema = schema_from_module(&module)?;
    let result = closure(&attr_set(&target), &schema.fds);
    emit(output, &result, render::closure)
}

fn cmd_analyze(input: &InputArgs, budget: &BudgetArgs, output: &OutputArgs) -> Result<()> {
    let module = input.load()?;
    // The relations are only checked when there are some.
    let has_relations = module.has_decomposition();
    input::validate(
        &module,
        Requirements {
            key_search: true,
            decomposition: has_relations,
        },
    )?;
    let schema = schema_from_module(&module)?;
    let rho = if has_relations {
        Some(decomposition_from_module(&module)?)
    } else {
        None
    };
    debug!(has_relations, "analyze");
    let analysis = analyze_with_budget(&schema, rho.as_deref(), &budget.budget());
    emit(output, &analysis, render::analysis)
}
