use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tforge",
    about = "Rule-based force field atom typing and parametrization",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Assign force field atom types to a structure
    #[command(name = "type", visible_alias = "t")]
    Type(TypeArgs),

    /// Type a structure and build its parametrized topology
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Validate a force field definition
    #[command(visible_alias = "c")]
    Check(CheckArgs),
}

impl Command {
    pub fn output(&self) -> &OutputOptions {
        match self {
            Command::Type(args) => &args.output,
            Command::Apply(args) => &args.output,
            Command::Check(args) => &args.output,
        }
    }
}

/// Force field selection shared by all commands.
#[derive(Args)]
#[command(next_help_heading = "Force Field")]
pub struct ForcefieldOptions {
    /// Bundled force field name
    #[arg(
        short = 'f',
        long,
        value_name = "NAME",
        default_value = "gaff-lite",
        conflicts_with = "ff_file"
    )]
    pub forcefield: String,

    /// Force field definition file (TOML)
    #[arg(long = "ff-file", value_name = "FILE")]
    pub ff_file: Option<PathBuf>,
}

/// Pipeline behavior shared by type and apply.
#[derive(Args)]
#[command(next_help_heading = "Pipeline")]
pub struct RunOptions {
    /// Report only the first failing atom or term
    #[arg(long)]
    pub first_error: bool,

    /// Process atoms and terms on a single thread
    #[arg(long)]
    pub serial: bool,

    /// Treat valence inconsistencies as errors
    #[arg(long)]
    pub strict_valence: bool,
}

#[derive(Args)]
pub struct OutputOptions {
    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args)]
pub struct TypeArgs {
    /// Structure file (TOML); stdin if omitted
    #[arg(value_name = "STRUCTURE")]
    pub structure: Option<PathBuf>,

    #[command(flatten)]
    pub forcefield: ForcefieldOptions,

    #[command(flatten)]
    pub run: RunOptions,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Structure file (TOML); stdin if omitted
    #[arg(value_name = "STRUCTURE")]
    pub structure: Option<PathBuf>,

    #[command(flatten)]
    pub forcefield: ForcefieldOptions,

    #[command(flatten)]
    pub run: RunOptions,

    /// Omit terms without parameters instead of failing
    #[arg(long, help_heading = "Pipeline")]
    pub best_effort: bool,

    /// Number of sample terms listed per interaction kind
    #[arg(long, value_name = "N", default_value = "5")]
    pub samples: usize,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub forcefield: ForcefieldOptions,

    #[command(flatten)]
    pub output: OutputOptions,
}

pub fn parse() -> Cli {
    Cli::parse()
}
