//! Molecular connectivity graph used by the typing and parametrization stages.
//!
//! [`MolecularGraph`] is built once from a [`System`] and is immutable in topology
//! afterwards. Construction validates the bond list and perceives the structural
//! properties that typing patterns query: ring bonds, smallest ring size per atom,
//! and aromaticity. The only mutable state is the per-atom assigned type, which is
//! committed exactly once by the typing engine.

use super::system::{Bond, System};
use super::types::{BondOrder, Element};
use log::warn;
use petgraph::algo::bridges;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Structural input that violates the graph invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("bond {i}-{j} references a missing atom (n_atoms = {n_atoms})")]
    BondOutOfRange { i: usize, j: usize, n_atoms: usize },

    #[error("atom {atom} is bonded to itself")]
    SelfBond { atom: usize },

    #[error("duplicate bond between atoms {i} and {j}")]
    DuplicateBond { i: usize, j: usize },

    #[error(
        "atom {atom} ({element}) has {degree} neighbors, more than its valence class allows ({max})"
    )]
    ValenceExceeded {
        atom: usize,
        element: Element,
        degree: usize,
        max: usize,
    },
}

/// How construction treats atoms whose degree exceeds their element's valence class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValenceCheck {
    /// Log a warning and continue.
    #[default]
    Advisory,
    /// Reject the structure with [`GraphError::ValenceExceeded`].
    Strict,
}

#[derive(Debug, Clone)]
struct GraphAtom {
    element: Element,
    formal_charge: i8,
    neighbors: Vec<usize>,
    aromatic: bool,
    in_ring: bool,
    smallest_ring: Option<usize>,
    assigned_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MolecularGraph {
    atoms: Vec<GraphAtom>,
    bonds: Vec<Bond>,
    orders: HashMap<(usize, usize), BondOrder>,
    ring_bonds: HashSet<(usize, usize)>,
    aromatic_bonds: HashSet<(usize, usize)>,
}

#[inline]
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl MolecularGraph {
    /// Builds the graph from a structure and perceives rings and aromaticity.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if a bond references a missing atom, bonds an atom
    /// to itself, or duplicates another bond, and, under [`ValenceCheck::Strict`],
    /// if an atom has more neighbors than its element's valence class allows.
    pub fn from_system(system: &System, valence_check: ValenceCheck) -> Result<Self, GraphError> {
        let n_atoms = system.atoms.len();

        let mut atoms: Vec<GraphAtom> = system
            .atoms
            .iter()
            .map(|a| GraphAtom {
                element: a.element,
                formal_charge: a.formal_charge,
                neighbors: Vec::new(),
                aromatic: false,
                in_ring: false,
                smallest_ring: None,
                assigned_type: None,
            })
            .collect();

        let mut orders = HashMap::with_capacity(system.bonds.len());
        let mut bonds = Vec::with_capacity(system.bonds.len());
        for bond in &system.bonds {
            if bond.i >= n_atoms || bond.j >= n_atoms {
                return Err(GraphError::BondOutOfRange {
                    i: bond.i,
                    j: bond.j,
                    n_atoms,
                });
            }
            if bond.i == bond.j {
                return Err(GraphError::SelfBond { atom: bond.i });
            }
            let key = edge_key(bond.i, bond.j);
            if orders.insert(key, bond.order).is_some() {
                return Err(GraphError::DuplicateBond { i: key.0, j: key.1 });
            }
            bonds.push(Bond::new(key.0, key.1, bond.order));
            atoms[key.0].neighbors.push(key.1);
            atoms[key.1].neighbors.push(key.0);
        }

        for atom in &mut atoms {
            atom.neighbors.sort_unstable();
        }

        for (idx, atom) in atoms.iter().enumerate() {
            let Some(max) = atom.element.max_valence() else {
                continue;
            };
            let allowed = max as usize + atom.formal_charge.unsigned_abs() as usize;
            let degree = atom.neighbors.len();
            if degree > allowed {
                match valence_check {
                    ValenceCheck::Strict => {
                        return Err(GraphError::ValenceExceeded {
                            atom: idx,
                            element: atom.element,
                            degree,
                            max: allowed,
                        });
                    }
                    ValenceCheck::Advisory => warn!(
                        "atom {} ({}) has {} neighbors, valence class allows {}",
                        idx, atom.element, degree, allowed
                    ),
                }
            }
        }

        let mut graph = Self {
            atoms,
            bonds,
            orders,
            ring_bonds: HashSet::new(),
            aromatic_bonds: HashSet::new(),
        };
        graph.perceive_rings();
        graph.perceive_aromaticity();

        Ok(graph)
    }

    fn perceive_rings(&mut self) {
        let core = self.cyclic_core();

        let mut ring_graph: UnGraph<Element, BondOrder> =
            UnGraph::with_capacity(self.atoms.len(), self.bonds.len());
        for atom in &self.atoms {
            ring_graph.add_node(atom.element);
        }
        for bond in self.bonds.iter().filter(|b| core[b.i] && core[b.j]) {
            ring_graph.add_edge(NodeIndex::new(bond.i), NodeIndex::new(bond.j), bond.order);
        }

        let bridge_edges: HashSet<EdgeIndex> = bridges(&ring_graph).map(|e| e.id()).collect();
        ring_graph.retain_edges(|_, e| !bridge_edges.contains(&e));

        let sizes: Vec<Option<usize>> = ring_graph
            .node_indices()
            .map(|v| smallest_ring_through(&ring_graph, v))
            .collect();

        for (atom, size) in self.atoms.iter_mut().zip(sizes) {
            atom.in_ring = size.is_some();
            atom.smallest_ring = size;
        }
        self.ring_bonds = ring_graph
            .edge_references()
            .map(|e| edge_key(e.source().index(), e.target().index()))
            .collect();
    }

    /// Atoms left after repeatedly stripping atoms with fewer than two
    /// remaining neighbors. Pendant trees never hold ring bonds.
    fn cyclic_core(&self) -> Vec<bool> {
        let mut degree: Vec<usize> = self.atoms.iter().map(|a| a.neighbors.len()).collect();
        let mut keep = vec![true; degree.len()];
        let mut queue: VecDeque<usize> = (0..degree.len()).filter(|&v| degree[v] < 2).collect();

        while let Some(v) = queue.pop_front() {
            if !keep[v] {
                continue;
            }
            keep[v] = false;
            for &w in &self.atoms[v].neighbors {
                if keep[w] {
                    degree[w] -= 1;
                    if degree[w] < 2 {
                        queue.push_back(w);
                    }
                }
            }
        }

        keep
    }

    /// Marks atoms incident to explicit aromatic bonds, and six-membered rings built
    /// entirely from 3-connected carbons or 2-connected nitrogens.
    fn perceive_aromaticity(&mut self) {
        for bond in &self.bonds {
            if bond.order == BondOrder::Aromatic {
                self.aromatic_bonds.insert(bond.key());
                self.atoms[bond.i].aromatic = true;
                self.atoms[bond.j].aromatic = true;
            }
        }

        let candidate: Vec<bool> = self
            .atoms
            .iter()
            .map(|a| {
                matches!(
                    (a.element, a.neighbors.len()),
                    (Element::C, 3) | (Element::N, 2)
                ) && a.in_ring
            })
            .collect();

        let mut rings = Vec::new();
        let mut path = Vec::with_capacity(6);
        for start in 0..self.atoms.len() {
            if !candidate[start] {
                continue;
            }
            path.clear();
            path.push(start);
            self.extend_six_ring(&candidate, &mut path, &mut rings);
        }

        for ring in rings {
            for pos in 0..6 {
                let (a, b) = (ring[pos], ring[(pos + 1) % 6]);
                self.atoms[a].aromatic = true;
                self.aromatic_bonds.insert(edge_key(a, b));
            }
        }
    }

    fn extend_six_ring(&self, candidate: &[bool], path: &mut Vec<usize>, out: &mut Vec<[usize; 6]>) {
        let last = path[path.len() - 1];
        if path.len() == 6 {
            if self.atoms[last].neighbors.binary_search(&path[0]).is_ok() {
                out.push([path[0], path[1], path[2], path[3], path[4], path[5]]);
            }
            return;
        }
        for &next in &self.atoms[last].neighbors {
            if next > path[0] && candidate[next] && !path.contains(&next) {
                path.push(next);
                self.extend_six_ring(candidate, path, out);
                path.pop();
            }
        }
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Neighbor indices of `atom` in ascending order.
    #[inline]
    pub fn neighbors(&self, atom: usize) -> &[usize] {
        &self.atoms[atom].neighbors
    }

    #[inline]
    pub fn degree(&self, atom: usize) -> usize {
        self.atoms[atom].neighbors.len()
    }

    #[inline]
    pub fn element(&self, atom: usize) -> Element {
        self.atoms[atom].element
    }

    #[inline]
    pub fn formal_charge(&self, atom: usize) -> i8 {
        self.atoms[atom].formal_charge
    }

    #[inline]
    pub fn is_aromatic(&self, atom: usize) -> bool {
        self.atoms[atom].aromatic
    }

    #[inline]
    pub fn is_in_ring(&self, atom: usize) -> bool {
        self.atoms[atom].in_ring
    }

    /// Size of the smallest ring containing `atom`, if any.
    #[inline]
    pub fn smallest_ring_size(&self, atom: usize) -> Option<usize> {
        self.atoms[atom].smallest_ring
    }

    pub fn bond_order(&self, a: usize, b: usize) -> Option<BondOrder> {
        self.orders.get(&edge_key(a, b)).copied()
    }

    pub fn is_bonded(&self, a: usize, b: usize) -> bool {
        self.orders.contains_key(&edge_key(a, b))
    }

    pub fn is_aromatic_bond(&self, a: usize, b: usize) -> bool {
        self.aromatic_bonds.contains(&edge_key(a, b))
    }

    pub fn is_ring_bond(&self, a: usize, b: usize) -> bool {
        self.ring_bonds.contains(&edge_key(a, b))
    }

    pub fn assigned_type(&self, atom: usize) -> Option<&str> {
        self.atoms[atom].assigned_type.as_deref()
    }

    /// Returns `true` once every atom carries an assigned type.
    pub fn is_typed(&self) -> bool {
        self.atoms.iter().all(|a| a.assigned_type.is_some())
    }

    /// Returns `true` if any atom carries an assigned type.
    pub fn has_assigned_types(&self) -> bool {
        self.atoms.iter().any(|a| a.assigned_type.is_some())
    }

    /// Commits one type per atom. Callers guarantee the graph is untyped and
    /// `types` has one entry per atom.
    pub(crate) fn commit_types(&mut self, types: Vec<String>) {
        debug_assert_eq!(types.len(), self.atoms.len());
        debug_assert!(!self.has_assigned_types());
        for (atom, name) in self.atoms.iter_mut().zip(types) {
            atom.assigned_type = Some(name);
        }
    }
}

/// Length of the shortest cycle through `v`, found by a BFS that labels every
/// reached atom with the neighbor of `v` it descends from. An edge joining two
/// differently labelled atoms closes a simple cycle through `v`. Every edge of
/// `ring_graph` is a ring bond.
fn smallest_ring_through(ring_graph: &UnGraph<Element, BondOrder>, v: NodeIndex) -> Option<usize> {
    let mut seen: HashMap<NodeIndex, (usize, NodeIndex)> = HashMap::new();
    let mut queue = VecDeque::new();

    for w in ring_graph.neighbors(v) {
        seen.insert(w, (1, w));
        queue.push_back(w);
    }

    let mut best: Option<usize> = None;
    while let Some(x) = queue.pop_front() {
        let (dx, bx) = seen[&x];
        if best.is_some_and(|b| 2 * dx + 1 >= b) {
            break;
        }
        for y in ring_graph.neighbors(x) {
            if y == v {
                continue;
            }
            match seen.get(&y) {
                None => {
                    seen.insert(y, (dx + 1, bx));
                    queue.push_back(y);
                }
                Some(&(dy, by)) if by != bx => {
                    let len = dx + dy + 1;
                    best = Some(best.map_or(len, |b| b.min(len)));
                }
                Some(_) => {}
            }
        }
    }

    best
}
