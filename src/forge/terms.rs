//! Bonded-term enumeration over the molecular graph.
//!
//! Every term is produced exactly once: bonds per edge, angles per center with
//! ends in ascending index order, proper dihedrals per central bond, and
//! impropers per the force field's declared policy.

use crate::forcefield::{ImproperGeneration, ImproperPolicy};
use crate::model::graph::MolecularGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TermSet {
    pub bonds: Vec<[usize; 2]>,
    pub angles: Vec<[usize; 3]>,
    pub dihedrals: Vec<[usize; 4]>,
    /// Center first, neighbors ascending.
    pub impropers: Vec<[usize; 4]>,
}

impl TermSet {
    pub fn enumerate(graph: &MolecularGraph, policy: &ImproperPolicy) -> Self {
        Self {
            bonds: bonds(graph),
            angles: angles(graph),
            dihedrals: dihedrals(graph),
            impropers: impropers(graph, policy.generation),
        }
    }

    pub fn len(&self) -> usize {
        self.bonds.len() + self.angles.len() + self.dihedrals.len() + self.impropers.len()
    }
}

fn bonds(graph: &MolecularGraph) -> Vec<[usize; 2]> {
    graph.bonds().iter().map(|b| [b.i, b.j]).collect()
}

fn angles(graph: &MolecularGraph) -> Vec<[usize; 3]> {
    let mut out = Vec::new();
    for center in 0..graph.atom_count() {
        let neighbors = graph.neighbors(center);
        for (a, &i) in neighbors.iter().enumerate() {
            for &k in &neighbors[a + 1..] {
                out.push([i, center, k]);
            }
        }
    }
    out
}

fn dihedrals(graph: &MolecularGraph) -> Vec<[usize; 4]> {
    let mut out = Vec::new();
    for bond in graph.bonds() {
        let (j, k) = (bond.i, bond.j);
        for &i in graph.neighbors(j) {
            if i == k {
                continue;
            }
            for &l in graph.neighbors(k) {
                // l == i would close a three-membered ring.
                if l == j || l == i {
                    continue;
                }
                out.push([i, j, k, l]);
            }
        }
    }
    out
}

fn impropers(graph: &MolecularGraph, generation: ImproperGeneration) -> Vec<[usize; 4]> {
    let mut out = Vec::new();
    for center in 0..graph.atom_count() {
        let neighbors = graph.neighbors(center);
        match generation {
            ImproperGeneration::Disabled => {}
            ImproperGeneration::ExactlyThree => {
                if let [a, b, c] = *neighbors {
                    out.push([center, a, b, c]);
                }
            }
            ImproperGeneration::AllCombinations => {
                let n = neighbors.len();
                for x in 0..n {
                    for y in x + 1..n {
                        for z in y + 1..n {
                            out.push([center, neighbors[x], neighbors[y], neighbors[z]]);
                        }
                    }
                }
            }
        }
    }
    out
}
