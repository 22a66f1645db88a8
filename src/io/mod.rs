//! Loaders that surround the typing core: force-field definitions, bundled
//! force fields, and structure files.
//!
//! Everything here produces the in-memory data model ([`Forcefield`](crate::Forcefield),
//! [`System`](crate::System)); nothing in the core reads files or the environment.

pub mod error;

mod forcefield;
mod structure;

pub use error::Error;
pub use forcefield::{available_forcefields, builtin_forcefield, parse_forcefield, read_forcefield};
pub use structure::{parse_structure, read_structure};
