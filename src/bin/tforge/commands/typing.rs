use std::io::{self, Write};

use anyhow::{Context, Result};

use typeforge::{ForgeError, MolecularGraph, assign_types};

use crate::cli::TypeArgs;
use crate::config::{build_forge_config, forcefield_label, load_forcefield};
use crate::display::{
    Context as DisplayContext, Progress, print_structure_info, print_type_distribution,
    write_atom_types,
};

const TOTAL_STEPS: u8 = 3;

pub fn run_type(args: TypeArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);
    let config = build_forge_config(&args.run);

    progress.step("Loading force field");
    let forcefield = load_forcefield(&args.forcefield)?;
    progress.complete_step(
        "Loading force field",
        &[format!(
            "{} ({} rules)",
            forcefield_label(&args.forcefield),
            forcefield.rules().len()
        )],
    );

    progress.step("Reading structure");
    let system = super::read_structure(args.structure.as_deref())?;
    let graph = MolecularGraph::from_system(&system, config.valence_check)
        .map_err(ForgeError::from)
        .context("Structure is not a valid molecular graph")?;
    progress.complete_step(
        "Reading structure",
        &[
            "Parse TOML structure".to_string(),
            "Perceive rings and aromaticity".to_string(),
        ],
    );

    if ctx.interactive {
        print_structure_info(&system);
    }

    progress.step("Assigning atom types");
    let typed = match assign_types(graph, forcefield.rules(), &config) {
        Ok(typed) => typed,
        Err(e) => {
            progress.fail_step("Assigning atom types");
            return Err(e).context("Atom typing failed");
        }
    };
    progress.complete_step(
        "Assigning atom types",
        &[format!(
            "{} atoms, {} parallel",
            typed.atom_count(),
            if config.parallel { "rayon" } else { "no" }
        )],
    );

    if ctx.interactive {
        print_type_distribution(&typed);
    }

    let mut stdout = io::stdout().lock();
    write_atom_types(&mut stdout, &typed).context("Failed to write atom types")?;
    stdout.flush().context("Failed to write atom types")?;

    progress.finish("Typing complete");
    Ok(())
}
