//! Loading and validating `fd_v1` input for a command.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use relnorm_dsl::fd_v1::{parse_attr_list_v1, parse_fd_list_v1, parse_fd_module_v1, FdModuleV1, RelationDeclV1};
use relnorm_dsl::validate::{
    validate_decomposition, validate_for_key_search, validate_module, ValidationLimits,
};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// `fd_v1` file (`-` reads stdin)
    #[arg(required_unless_present = "fds", conflicts_with = "fds")]
    pub input: Option<PathBuf>,

    /// Inline FD list instead of a file, e.g. "AB -> C; C -> A"
    #[arg(long)]
    pub fds: Option<String>,

    /// Decomposition to add, relations separated by `;`, e.g. "AB; BC"
    #[arg(long)]
    pub relations: Option<String>,
}

/// Which checks beyond the basic shape/size contract a command needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Requirements {
    pub key_search: bool,
    pub decomposition: bool,
}

impl InputArgs {
    pub fn load(&self) -> Result<FdModuleV1> {
        let mut module = match (&self.input, &self.fds) {
            (_, Some(fds)) => FdModuleV1 {
                fds: parse_fd_list_v1(fds).context("--fds")?,
                ..Default::default()
            },
            (Some(path), None) => {
                let (label, text) = read_source(path)?;
                parse_fd_module_v1(&text).with_context(|| format!("failed to parse {label}"))?
            }
            (None, None) => return Err(anyhow!("no input: pass a file, `-`, or --fds")),
        };

        if let Some(relations) = &self.relations {
            let offset = module.relations.len();
            for (i, part) in relations
                .split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .enumerate()
            {
                let attributes = parse_attr_list_v1(part).map_err(|e| anyhow!("--relations: {e}"))?;
                module.relations.push(RelationDeclV1 {
                    name: format!("R{}", offset + i + 1),
                    attributes,
                });
            }
        }

        debug!(
            fds = module.fds.len(),
            relations = module.relations.len(),
            "loaded module"
        );
        Ok(module)
    }

    /// Load, then enforce the validation contract.
    pub fn load_validated(&self, requirements: Requirements) -> Result<FdModuleV1> {
        let module = self.load()?;
        validate(&module, requirements)?;
        Ok(module)
    }
}

pub fn validate(module: &FdModuleV1, requirements: Requirements) -> Result<()> {
    let limits = ValidationLimits::default();
    validate_module(module, &limits).map_err(|e| anyhow!("invalid input: {e}"))?;
    if requirements.key_search {
        validate_for_key_search(module, &limits).map_err(|e| anyhow!("invalid input: {e}"))?;
    }
    if requirements.decomposition {
        validate_decomposition(module, &limits).map_err(|e| anyhow!("invalid input: {e}"))?;
    }
    Ok(())
}

fn read_source(path: &PathBuf) -> Result<(String, String)> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(("<stdin>".to_string(), text));
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    Ok((format!("`{}`", path.display()), text))
}
