use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::cli::CheckArgs;
use crate::config::{forcefield_label, load_forcefield};
use crate::display::{Context as DisplayContext, Progress, print_forcefield_summary, print_rule_table};

const TOTAL_STEPS: u8 = 2;

pub fn run_check(args: CheckArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Loading force field");
    let forcefield = load_forcefield(&args.forcefield)?;
    progress.complete_step("Loading force field", &[forcefield_label(&args.forcefield)]);

    progress.step("Validating override relation");
    if let Err(e) = forcefield.rules().validate() {
        progress.fail_step("Validating override relation");
        return Err(e).context("Force field failed validation");
    }
    progress.complete_step(
        "Validating override relation",
        &["Antisymmetric and acyclic".to_string()],
    );

    if ctx.interactive {
        print_forcefield_summary(&forcefield);
    }

    let mut stdout = io::stdout().lock();
    print_rule_table(&mut stdout, &forcefield).context("Failed to write rule table")?;
    stdout.flush().context("Failed to write rule table")?;

    progress.finish(&format!("{} is valid", forcefield.name()));
    Ok(())
}
