mod apply;
mod check;
mod typing;

use apply::run_apply;
use check::run_check;
use typing::run_type;

use std::path::Path;

use anyhow::{Context as _, Result, bail};

use typeforge::System;

use crate::cli::Command;
use crate::display::Context;
use crate::io::{open_input, stdin_is_tty};

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Type(args) => run_type(args, ctx),
        Command::Apply(args) => run_apply(args, ctx),
        Command::Check(args) => run_check(args, ctx),
    }
}

fn read_structure(path: Option<&Path>) -> Result<System> {
    if path.is_none() && stdin_is_tty() {
        bail!(
            "No structure file specified and stdin is a terminal.\n\nUsage: tforge <COMMAND> <STRUCTURE> or pipe TOML via stdin."
        );
    }

    let input = open_input(path)?;
    let source = input.describe();
    typeforge::io::read_structure(input)
        .with_context(|| format!("Failed to read structure from {}", source))
}
