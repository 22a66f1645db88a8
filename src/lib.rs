//! Rule-based force-field atom typing and bonded-term parametrization for
//! molecular graphs.
//!
//! Given a molecular structure and a force field, the library assigns every atom
//! a force-field atom type by matching atom-centered graph patterns, resolves
//! overlapping matches through an explicit override relation ("most specific
//! rule wins"), and then builds a parametrized topology: bonds, angles, proper
//! dihedrals, and impropers, each with a parameter record looked up by atom
//! types with wildcard fallback.
//!
//! # Features
//!
//! - **Pattern typing**: atom-centered pattern trees with element, degree,
//!   charge, aromaticity, ring, bond-order, and type-reference constraints,
//!   matched by bounded backtracking
//! - **Explicit precedence**: the override relation is a validated DAG; an atom
//!   left with two unrelated candidates is reported, never silently resolved
//! - **Wildcard parameters**: lookups fall back from exact keys to wildcarded
//!   keys, outer positions first
//! - **Parallel pipeline**: per-atom typing and per-term lookup run on rayon,
//!   with cooperative cancellation and deterministic results
//!
//! # Quick Start
//!
//! ```
//! use typeforge::{Atom, BondOrder, Element, ForgeConfig, System};
//!
//! // Benzene: six aromatic carbons, each carrying one hydrogen.
//! let mut system = System::new();
//! for _ in 0..6 {
//!     system.add_atom(Atom::new(Element::C));
//! }
//! for _ in 0..6 {
//!     system.add_atom(Atom::new(Element::H));
//! }
//! for i in 0..6 {
//!     system.add_bond(i, (i + 1) % 6, BondOrder::Aromatic);
//!     system.add_bond(i, i + 6, BondOrder::Single);
//! }
//!
//! let forcefield = typeforge::io::builtin_forcefield("gaff-lite")?;
//! let topology = typeforge::apply(&system, &forcefield, &ForgeConfig::default())?;
//!
//! assert_eq!(topology.count_type("ca"), 6);
//! assert_eq!(topology.count_type("ha"), 6);
//! assert_eq!(topology.bonds.len(), 12);
//! assert_eq!(topology.angles.len(), 18);
//! assert_eq!(topology.dihedrals.len(), 24);
//! assert_eq!(topology.impropers.len(), 6);
//! assert_eq!(topology.periodic_torsions().count(), 30);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`model`]: input structures, the molecular graph, and the parametrized topology
//! - [`forcefield`]: typing rules, patterns, and bonded parameter tables
//! - [`io`]: TOML force-field and structure loaders, bundled force fields
//! - [`apply`], [`assign_types`], [`build_parametrized_topology`]: pipeline entry points

mod forge;

pub mod forcefield;
pub mod io;
pub mod model;

pub use model::atom::Atom;
pub use model::graph::{GraphError, MolecularGraph, ValenceCheck};
pub use model::system::{Bond, System};
pub use model::topology::{
    AngleTerm, BondTerm, BondedTerm, DihedralTerm, ImproperTerm, ParametrizedTopology, TermKind,
    UnparametrizedTerm,
};
pub use model::types::{BondOrder, Element, ParseBondOrderError, ParseElementError};

pub use forcefield::Forcefield;

pub use forge::{
    CancelFlag, ErrorPolicy, ForgeConfig, ParametrizationError, TypingError, apply, assign_types,
    build_parametrized_topology,
};

pub use forge::Error as ForgeError;
