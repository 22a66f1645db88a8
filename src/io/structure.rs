//! TOML structure files: an atom list and a bond list, indexed from zero.
//!
//! ```toml
//! name = "water"
//!
//! [[atoms]]
//! element = "O"
//!
//! [[atoms]]
//! element = "H"
//!
//! [[atoms]]
//! element = "H"
//!
//! [[bonds]]
//! atoms = [0, 1]
//!
//! [[bonds]]
//! atoms = [0, 2]
//! order = "single"
//! ```

use super::error::Error;
use crate::model::atom::Atom;
use crate::model::system::System;
use crate::model::types::{BondOrder, Element};
use log::debug;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructureDef {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    atoms: Vec<AtomDef>,
    #[serde(default)]
    bonds: Vec<BondDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AtomDef {
    element: Element,
    #[serde(default)]
    charge: i8,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BondDef {
    atoms: [usize; 2],
    #[serde(default = "default_order")]
    order: BondOrder,
}

fn default_order() -> BondOrder {
    BondOrder::Single
}

pub fn read_structure<R: Read>(mut reader: R) -> Result<System, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_structure(&text)
}

pub fn parse_structure(text: &str) -> Result<System, Error> {
    let def: StructureDef = toml::from_str(text).map_err(|e| Error::parse("structure", e))?;

    let mut system = System::new();
    for atom in def.atoms {
        system.add_atom(Atom::new(atom.element).with_charge(atom.charge));
    }

    let n_atoms = system.atom_count();
    for (index, bond) in def.bonds.into_iter().enumerate() {
        let [i, j] = bond.atoms;
        if i >= n_atoms || j >= n_atoms {
            return Err(Error::InvalidStructure(format!(
                "bond #{} references atom {} but the structure has {} atoms",
                index,
                i.max(j),
                n_atoms
            )));
        }
        system.add_bond(i, j, bond.order);
    }

    debug!(
        "Read structure '{}' with {} atoms and {} bonds",
        def.name.as_deref().unwrap_or("unnamed"),
        system.atom_count(),
        system.bond_count()
    );
    Ok(system)
}
