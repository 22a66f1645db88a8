mod banner;
mod error;
mod progress;
mod tables;

pub use banner::{banner_for_help, print_banner};
pub use error::print_error;
pub use progress::Progress;
pub use tables::{
    print_forcefield_summary, print_rule_table, print_structure_info, print_term_summary,
    print_type_distribution, write_atom_types, write_sample_terms,
};

use crate::cli::OutputOptions;

/// Whether progress, banners, and summary tables go to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub interactive: bool,
}

impl Context {
    pub fn for_output(output: &OutputOptions) -> Self {
        Self {
            interactive: !output.quiet && crate::io::stderr_is_tty(),
        }
    }
}
