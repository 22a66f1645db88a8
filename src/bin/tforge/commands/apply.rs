use std::io::{self, Write};

use anyhow::{Context, Result};

use typeforge::{ForgeError, MolecularGraph, assign_types, build_parametrized_topology};

use crate::cli::ApplyArgs;
use crate::config::{build_forge_config, forcefield_label, load_forcefield};
use crate::display::{
    Context as DisplayContext, Progress, print_structure_info, print_term_summary,
    print_type_distribution, write_sample_terms,
};

const TOTAL_STEPS: u8 = 4;

pub fn run_apply(args: ApplyArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);
    let config = build_forge_config(&args.run).with_best_effort(args.best_effort);

    progress.step("Loading force field");
    let forcefield = load_forcefield(&args.forcefield)?;
    let label = forcefield_label(&args.forcefield);
    progress.complete_step(
        "Loading force field",
        &[format!("{} ({} rules)", label, forcefield.rules().len())],
    );

    progress.step("Reading structure");
    let system = super::read_structure(args.structure.as_deref())?;
    let graph = MolecularGraph::from_system(&system, config.valence_check)
        .map_err(ForgeError::from)
        .context("Structure is not a valid molecular graph")?;
    progress.complete_step("Reading structure", &[]);

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
    progress.complete_step("Assigning atom types", &[]);

    if ctx.interactive {
        print_type_distribution(&typed);
    }

    progress.step("Parametrizing bonded terms");
    let topology = match build_parametrized_topology(
        typed,
        forcefield.parameters(),
        forcefield.name(),
        &config,
    ) {
        Ok(topology) => topology,
        Err(e) => {
            progress.fail_step("Parametrizing bonded terms");
            return Err(e).context("Parametrization failed");
        }
    };
    let mut substeps = vec![format!("{} terms parametrized", topology.term_count())];
    if !topology.is_complete() {
        substeps.push(format!(
            "{} terms left unparametrized",
            topology.unparametrized.len()
        ));
    }
    progress.complete_step("Parametrizing bonded terms", &substeps);

    if ctx.interactive {
        print_term_summary(&topology);
    }

    let mut stdout = io::stdout().lock();
    write_sample_terms(&mut stdout, &topology, args.samples)
        .context("Failed to write topology")?;
    stdout.flush().context("Failed to write topology")?;

    progress.finish(&format!("Topology built with {}", label));
    Ok(())
}
