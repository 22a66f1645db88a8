use super::graph::MolecularGraph;
use crate::forcefield::{AngleParams, BondParams, DihedralParams, ImproperParams};
use std::collections::BTreeSet;
use std::fmt;

/// Interaction order of a bonded term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermKind {
    Bond,
    Angle,
    Dihedral,
    Improper,
}

impl TermKind {
    /// Number of atoms in a term of this kind.
    pub fn arity(&self) -> usize {
        match self {
            TermKind::Bond => 2,
            TermKind::Angle => 3,
            TermKind::Dihedral | TermKind::Improper => 4,
        }
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermKind::Bond => write!(f, "bond"),
            TermKind::Angle => write!(f, "angle"),
            TermKind::Dihedral => write!(f, "dihedral"),
            TermKind::Improper => write!(f, "improper"),
        }
    }
}

/// A bonded term with its attached parameter record.
///
/// `key` is the parameter-table key that matched, in the table's canonical
/// layout; it may contain wildcards (`*`) when the exact type tuple had no entry.
/// For impropers the key is center-first while `atoms` follows the force field's
/// declared center position.
#[derive(Debug, Clone, PartialEq)]
pub struct BondedTerm<const N: usize, P> {
    pub atoms: [usize; N],
    pub key: [String; N],
    pub params: P,
}

pub type BondTerm = BondedTerm<2, BondParams>;
pub type AngleTerm = BondedTerm<3, AngleParams>;
pub type DihedralTerm = BondedTerm<4, DihedralParams>;
pub type ImproperTerm = BondedTerm<4, ImproperParams>;

/// A term for which no parameter entry exists at any wildcard level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparametrizedTerm {
    pub kind: TermKind,
    pub atoms: Vec<usize>,
    pub types: Vec<String>,
}

impl fmt::Display for UnparametrizedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atoms: Vec<String> = self.atoms.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} {} with types {}",
            self.kind,
            atoms.join("-"),
            self.types.join("-")
        )
    }
}

/// A typed molecular graph with every bonded term parametrized.
///
/// Outside best-effort mode `unparametrized` is always empty.
#[derive(Debug, Clone)]
pub struct ParametrizedTopology {
    pub forcefield: String,
    pub graph: MolecularGraph,
    pub bonds: Vec<BondTerm>,
    pub angles: Vec<AngleTerm>,
    pub dihedrals: Vec<DihedralTerm>,
    pub impropers: Vec<ImproperTerm>,
    pub unparametrized: Vec<UnparametrizedTerm>,
}

impl ParametrizedTopology {
    /// Distinct assigned type names, sorted.
    pub fn atom_types(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = (0..self.graph.atom_count())
            .filter_map(|i| self.graph.assigned_type(i))
            .collect();
        names.into_iter().collect()
    }

    /// Number of atoms carrying the given type.
    pub fn count_type(&self, type_name: &str) -> usize {
        (0..self.graph.atom_count())
            .filter(|&i| self.graph.assigned_type(i) == Some(type_name))
            .count()
    }

    /// Proper dihedrals followed by periodic impropers, the layout AMBER-family
    /// engines use for a single periodic torsion list.
    pub fn periodic_torsions(&self) -> impl Iterator<Item = [usize; 4]> + '_ {
        let propers = self.dihedrals.iter().map(|d| d.atoms);
        let impropers = self
            .impropers
            .iter()
            .filter(|imp| matches!(imp.params, ImproperParams::Periodic { .. }))
            .map(|imp| imp.atoms);
        propers.chain(impropers)
    }

    pub fn is_complete(&self) -> bool {
        self.unparametrized.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.bonds.len() + self.angles.len() + self.dihedrals.len() + self.impropers.len()
    }
}
