//! Atom-centered structural patterns used by typing rules.
//!
//! A pattern is a small tree: each [`AtomPattern`] node constrains one realized
//! atom and lists child [`Slot`]s that must be filled by distinct neighbors. A
//! slot is either another atom node reached through a bond constraint, or a ring
//! closure that must land on the atom already realized by an earlier labelled
//! node. Patterns are compiled once into a [`PatternProgram`], a pre-order list of
//! nodes that the matcher walks with bounded backtracking.

use super::error::Error;
use crate::model::types::{BondOrder, Element};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ElementConstraint {
    #[default]
    Any,
    Is(Element),
    OneOf(Vec<Element>),
}

impl ElementConstraint {
    pub fn accepts(&self, element: Element) -> bool {
        match self {
            ElementConstraint::Any => true,
            ElementConstraint::Is(e) => *e == element,
            ElementConstraint::OneOf(list) => list.contains(&element),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondConstraint {
    #[default]
    Any,
    Order(BondOrder),
}

/// Constraints on a single realized atom, plus its child slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomPattern {
    pub element: ElementConstraint,
    pub degree: Option<usize>,
    pub formal_charge: Option<i8>,
    pub aromatic: Option<bool>,
    pub in_ring: Option<bool>,
    pub ring_size: Option<usize>,
    /// Candidate type the realized atom must already carry.
    pub type_ref: Option<String>,
    /// Label that ring-closure slots may refer back to.
    pub label: Option<String>,
    /// Child slots enumerate every neighbor not used by the parent edge.
    pub exhaustive: bool,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Atom {
        bond: BondConstraint,
        pattern: AtomPattern,
    },
    Closure {
        bond: BondConstraint,
        label: String,
    },
}

impl AtomPattern {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn element(element: Element) -> Self {
        Self {
            element: ElementConstraint::Is(element),
            ..Self::default()
        }
    }

    pub fn one_of(elements: impl IntoIterator<Item = Element>) -> Self {
        Self {
            element: ElementConstraint::OneOf(elements.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = Some(degree);
        self
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.formal_charge = Some(charge);
        self
    }

    pub fn aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = Some(aromatic);
        self
    }

    pub fn in_ring(mut self, in_ring: bool) -> Self {
        self.in_ring = Some(in_ring);
        self
    }

    pub fn with_ring_size(mut self, size: usize) -> Self {
        self.ring_size = Some(size);
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_ref = Some(type_name.into());
        self
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn exhaustive(mut self) -> Self {
        self.exhaustive = true;
        self
    }

    pub fn neighbor(self, pattern: AtomPattern) -> Self {
        self.neighbor_via(BondConstraint::Any, pattern)
    }

    pub fn neighbor_via(mut self, bond: BondConstraint, pattern: AtomPattern) -> Self {
        self.slots.push(Slot::Atom { bond, pattern });
        self
    }

    pub fn closure(mut self, label: impl Into<String>) -> Self {
        self.slots.push(Slot::Closure {
            bond: BondConstraint::Any,
            label: label.into(),
        });
        self
    }

    /// Depth of the deepest atom slot below this node.
    pub fn radius(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Atom { pattern, .. } => 1 + pattern.radius(),
                Slot::Closure { .. } => 1,
            })
            .max()
            .unwrap_or(0)
    }

    /// Iterates over this node and every atom node below it, pre-order.
    pub fn walk(&self) -> Vec<&AtomPattern> {
        let mut out = vec![self];
        for slot in &self.slots {
            if let Slot::Atom { pattern, .. } = slot {
                out.extend(pattern.walk());
            }
        }
        out
    }
}

/// Property tests applied to a realized atom.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AtomTest {
    pub element: ElementConstraint,
    pub degree: Option<usize>,
    pub formal_charge: Option<i8>,
    pub aromatic: Option<bool>,
    pub in_ring: Option<bool>,
    pub ring_size: Option<usize>,
    pub type_ref: Option<String>,
    /// Required degree implied by an exhaustive slot list.
    pub exact_degree: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind {
    Atom(AtomTest),
    /// Must realize the same atom as the referenced earlier node.
    Closure(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub parent: Option<usize>,
    pub bond: BondConstraint,
    pub kind: NodeKind,
}

/// Pre-order flattening of a pattern tree.
///
/// Every node's parent precedes it, and every closure target precedes the closure,
/// so a left-to-right assignment always has the atoms it needs already realized.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternProgram {
    pub(crate) nodes: Vec<Node>,
    type_refs: bool,
}

impl PatternProgram {
    pub fn compile(rule_id: &str, root: &AtomPattern) -> Result<Self, Error> {
        let mut compiler = Compiler {
            rule_id,
            nodes: Vec::new(),
            labels: HashMap::new(),
            closures: HashSet::new(),
        };
        compiler.push_atom(root, None, BondConstraint::Any)?;
        let type_refs = compiler
            .nodes
            .iter()
            .any(|n| matches!(&n.kind, NodeKind::Atom(t) if t.type_ref.is_some()));
        Ok(Self {
            nodes: compiler.nodes,
            type_refs,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if any node depends on previously assigned candidate types.
    pub fn has_type_references(&self) -> bool {
        self.type_refs
    }
}

struct Compiler<'a> {
    rule_id: &'a str,
    nodes: Vec<Node>,
    labels: HashMap<&'a str, usize>,
    /// Closure edges as `(low, high)` node pairs.
    closures: HashSet<(usize, usize)>,
}

impl<'a> Compiler<'a> {
    fn invalid(&self, detail: impl Into<String>) -> Error {
        Error::invalid_pattern(self.rule_id, detail)
    }

    fn push_atom(
        &mut self,
        pattern: &'a AtomPattern,
        parent: Option<usize>,
        bond: BondConstraint,
    ) -> Result<(), Error> {
        let index = self.nodes.len();
        let exact_degree = pattern
            .exhaustive
            .then(|| pattern.slots.len() + usize::from(parent.is_some()));

        if let (Some(declared), Some(implied)) = (pattern.degree, exact_degree) {
            if declared != implied {
                return Err(self.invalid(format!(
                    "node {} declares degree {} but enumerates {} neighbors",
                    index, declared, implied
                )));
            }
        }

        self.nodes.push(Node {
            parent,
            bond,
            kind: NodeKind::Atom(AtomTest {
                element: pattern.element.clone(),
                degree: pattern.degree,
                formal_charge: pattern.formal_charge,
                aromatic: pattern.aromatic,
                in_ring: pattern.in_ring,
                ring_size: pattern.ring_size,
                type_ref: pattern.type_ref.clone(),
                exact_degree,
            }),
        });

        if let Some(label) = pattern.label.as_deref() {
            if self.labels.insert(label, index).is_some() {
                return Err(self.invalid(format!("label '{}' is defined twice", label)));
            }
        }

        for slot in &pattern.slots {
            match slot {
                Slot::Atom { bond, pattern: child } => self.push_atom(child, Some(index), *bond)?,
                Slot::Closure { bond, label } => self.push_closure(index, *bond, label)?,
            }
        }

        Ok(())
    }

    fn push_closure(&mut self, host: usize, bond: BondConstraint, label: &str) -> Result<(), Error> {
        let Some(&target) = self.labels.get(label) else {
            return Err(self.invalid(format!(
                "ring closure refers to label '{}' before it is defined",
                label
            )));
        };
        if target == host {
            return Err(self.invalid(format!("ring closure '{}' points at its own host", label)));
        }
        // The edge host-target must not already be a tree edge.
        if self.nodes[host].parent == Some(target) || self.nodes[target].parent == Some(host) {
            return Err(self.invalid(format!(
                "ring closure '{}' duplicates a direct pattern bond",
                label
            )));
        }
        if !self.closures.insert((host.min(target), host.max(target))) {
            return Err(self.invalid(format!(
                "ring closure '{}' closes an edge that is already closed",
                label
            )));
        }
        self.nodes.push(Node {
            parent: Some(host),
            bond,
            kind: NodeKind::Closure(target),
        });
        Ok(())
    }
}
