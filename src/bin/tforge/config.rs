use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};

use typeforge::{ErrorPolicy, ForgeConfig, Forcefield, ValenceCheck};

use crate::cli::{ForcefieldOptions, RunOptions};

pub fn build_forge_config(run: &RunOptions) -> ForgeConfig {
    ForgeConfig::default()
        .with_error_policy(if run.first_error {
            ErrorPolicy::FirstError
        } else {
            ErrorPolicy::CollectAll
        })
        .with_parallel(!run.serial)
        .with_valence_check(if run.strict_valence {
            ValenceCheck::Strict
        } else {
            ValenceCheck::Advisory
        })
}

pub fn load_forcefield(opts: &ForcefieldOptions) -> Result<Forcefield> {
    match &opts.ff_file {
        Some(path) => {
            let file = File::open(path).with_context(|| {
                format!("Failed to open force field file: {}", path.display())
            })?;
            typeforge::io::read_forcefield(BufReader::new(file))
                .with_context(|| format!("Failed to load force field from {}", path.display()))
        }
        None => typeforge::io::builtin_forcefield(&opts.forcefield)
            .with_context(|| format!("Failed to load bundled force field '{}'", opts.forcefield)),
    }
}

/// Short label for the force field source, used in progress output.
pub fn forcefield_label(opts: &ForcefieldOptions) -> String {
    match &opts.ff_file {
        Some(path) => path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned(),
        None => opts.forcefield.clone(),
    }
}
