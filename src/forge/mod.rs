mod config;
mod error;
mod matcher;
mod paramgen;
mod terms;
mod typer;

pub use config::{CancelFlag, ErrorPolicy, ForgeConfig};
pub use error::{Error, ParametrizationError, TypingError};
pub use paramgen::build_parametrized_topology;
pub use typer::assign_types;

use crate::forcefield::Forcefield;
use crate::model::graph::MolecularGraph;
use crate::model::system::System;
use crate::model::topology::ParametrizedTopology;

/// Builds the molecular graph for `system`, types every atom with the force
/// field's rules, and parametrizes every bonded term.
///
/// Either stage failing fails the whole run; nothing partial is returned unless
/// `config.best_effort` is set, in which case only unparametrized terms are
/// tolerated.
pub fn apply(
    system: &System,
    forcefield: &Forcefield,
    config: &ForgeConfig,
) -> Result<ParametrizedTopology, Error> {
    let graph = MolecularGraph::from_system(system, config.valence_check)?;
    let typed = assign_types(graph, forcefield.rules(), config)?;
    build_parametrized_topology(typed, forcefield.parameters(), forcefield.name(), config)
}
