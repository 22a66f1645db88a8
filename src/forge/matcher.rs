use crate::forcefield::{AtomTest, BondConstraint, NodeKind, TypingRule};
use crate::model::graph::MolecularGraph;
use crate::model::types::BondOrder;
use std::collections::BTreeSet;

/// Read-only inputs shared by every match in one typing round.
#[derive(Clone, Copy)]
pub(crate) struct MatchContext<'a> {
    pub graph: &'a MolecularGraph,
    /// Candidate type names per atom from the previous round; `None` before the
    /// first round, when no type reference can succeed.
    pub candidates: Option<&'a [BTreeSet<String>]>,
}

impl<'a> MatchContext<'a> {
    pub fn new(graph: &'a MolecularGraph) -> Self {
        Self {
            graph,
            candidates: None,
        }
    }

    pub fn with_candidates(mut self, candidates: &'a [BTreeSet<String>]) -> Self {
        self.candidates = Some(candidates);
        self
    }
}

/// Returns `true` if `rule` matches the environment of `atom`.
///
/// The rule's pattern root is pinned to `atom`; every other pattern node must be
/// realized by a distinct graph atom adjacent to its parent's realization. Any
/// satisfying assignment is enough.
pub(crate) fn matches(ctx: MatchContext<'_>, atom: usize, rule: &TypingRule) -> bool {
    if ctx.graph.element(atom) != rule.element() {
        return false;
    }
    let program = rule.program();
    let Some(first) = program.nodes.first() else {
        return false;
    };
    let NodeKind::Atom(root_test) = &first.kind else {
        return false;
    };
    if !atom_passes(ctx, atom, root_test) {
        return false;
    }

    let mut search = Search {
        ctx,
        nodes: &program.nodes,
        realized: vec![usize::MAX; program.nodes.len()],
    };
    search.realized[0] = atom;
    search.extend(1)
}

struct Search<'a> {
    ctx: MatchContext<'a>,
    nodes: &'a [crate::forcefield::PatternNode],
    /// Graph atom bound to each pattern node; only `..k` is live at depth `k`.
    realized: Vec<usize>,
}

impl Search<'_> {
    fn extend(&mut self, k: usize) -> bool {
        if k == self.nodes.len() {
            return true;
        }
        let node = &self.nodes[k];
        let Some(parent) = node.parent else {
            return false;
        };
        let host = self.realized[parent];
        let graph = self.ctx.graph;

        match &node.kind {
            NodeKind::Closure(target) => {
                let atom = self.realized[*target];
                if !graph.is_bonded(host, atom) || !bond_passes(self.ctx, host, atom, node.bond) {
                    return false;
                }
                self.realized[k] = atom;
                let found = self.extend(k + 1);
                self.realized[k] = usize::MAX;
                found
            }
            NodeKind::Atom(test) => {
                for &neighbor in graph.neighbors(host) {
                    if self.realized[..k].contains(&neighbor)
                        || !bond_passes(self.ctx, host, neighbor, node.bond)
                        || !atom_passes(self.ctx, neighbor, test)
                    {
                        continue;
                    }
                    self.realized[k] = neighbor;
                    if self.extend(k + 1) {
                        return true;
                    }
                    self.realized[k] = usize::MAX;
                }
                false
            }
        }
    }
}

fn atom_passes(ctx: MatchContext<'_>, atom: usize, test: &AtomTest) -> bool {
    let graph = ctx.graph;
    if !test.element.accepts(graph.element(atom)) {
        return false;
    }
    let degree = graph.degree(atom);
    if test.degree.is_some_and(|d| d != degree) || test.exact_degree.is_some_and(|d| d != degree) {
        return false;
    }
    if test.formal_charge.is_some_and(|c| c != graph.formal_charge(atom)) {
        return false;
    }
    if test.aromatic.is_some_and(|a| a != graph.is_aromatic(atom)) {
        return false;
    }
    if test.in_ring.is_some_and(|r| r != graph.is_in_ring(atom)) {
        return false;
    }
    if let Some(size) = test.ring_size {
        if graph.smallest_ring_size(atom) != Some(size) {
            return false;
        }
    }
    if let Some(type_name) = &test.type_ref {
        let known = ctx
            .candidates
            .is_some_and(|sets| sets[atom].contains(type_name));
        if !known {
            return false;
        }
    }
    true
}

fn bond_passes(ctx: MatchContext<'_>, a: usize, b: usize, constraint: BondConstraint) -> bool {
    match constraint {
        BondConstraint::Any => true,
        BondConstraint::Order(BondOrder::Aromatic) => ctx.graph.is_aromatic_bond(a, b),
        BondConstraint::Order(order) => {
            ctx.graph.bond_order(a, b) == Some(order) && !ctx.graph.is_aromatic_bond(a, b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcefield::AtomPattern;
    use crate::model::atom::Atom;
    use crate::model::graph::ValenceCheck;
    use crate::model::system::System;
    use crate::model::types::Element;

    fn graph_of(system: &System) -> MolecularGraph {
        MolecularGraph::from_system(system, ValenceCheck::Advisory).unwrap()
    }

    fn make_ethanol() -> System {
        // C0 - C1 - O2 - H3, hydrogens on carbons 4..8
        let mut sys = System::new();
        for e in [Element::C, Element::C, Element::O, Element::H] {
            sys.add_atom(Atom::new(e));
        }
        for _ in 0..5 {
            sys.add_atom(Atom::new(Element::H));
        }
        sys.add_bond(0, 1, BondOrder::Single);
        sys.add_bond(1, 2, BondOrder::Single);
        sys.add_bond(2, 3, BondOrder::Single);
        for h in 4..7 {
            sys.add_bond(0, h, BondOrder::Single);
        }
        for h in 7..9 {
            sys.add_bond(1, h, BondOrder::Single);
        }
        sys
    }

    fn make_benzene() -> System {
        let mut sys = System::new();
        for _ in 0..6 {
            sys.add_atom(Atom::new(Element::C));
        }
        for _ in 0..6 {
            sys.add_atom(Atom::new(Element::H));
        }
        for i in 0..6 {
            sys.add_bond(i, (i + 1) % 6, BondOrder::Aromatic);
            sys.add_bond(i, i + 6, BondOrder::Single);
        }
        sys
    }

    fn rule(id: &str, element: Element, pattern: AtomPattern) -> TypingRule {
        TypingRule::new(id, element, pattern).unwrap()
    }

    #[test]
    fn matches_simple_neighbor_slots() {
        let g = graph_of(&make_ethanol());
        let h1 = rule(
            "h1",
            Element::H,
            AtomPattern::any().neighbor(AtomPattern::element(Element::C).neighbor(AtomPattern::element(Element::O))),
        );
        let ctx = MatchContext::new(&g);
        assert!(matches(ctx, 7, &h1));
        assert!(!matches(ctx, 4, &h1));
        assert!(!matches(ctx, 3, &h1));
    }

    #[test]
    fn root_element_must_match() {
        let g = graph_of(&make_ethanol());
        let c = rule("c3", Element::C, AtomPattern::any().with_degree(4));
        let ctx = MatchContext::new(&g);
        assert!(matches(ctx, 0, &c));
        assert!(!matches(ctx, 2, &c));
    }

    #[test]
    fn neighbor_slots_need_distinct_atoms() {
        let g = graph_of(&make_ethanol());
        // Oxygen has a single carbon neighbor; two carbon slots cannot both be filled.
        let two_carbons = rule(
            "ether",
            Element::O,
            AtomPattern::any()
                .neighbor(AtomPattern::element(Element::C))
                .neighbor(AtomPattern::element(Element::C)),
        );
        assert!(!matches(MatchContext::new(&g), 2, &two_carbons));
    }

    #[test]
    fn backtracks_over_neighbor_permutations() {
        let g = graph_of(&make_ethanol());
        // The first H slot could greedily take any hydrogen; the C slot below the
        // second slot requires the search to try the carbon only there.
        let p = AtomPattern::any()
            .neighbor(AtomPattern::any())
            .neighbor(AtomPattern::element(Element::C).neighbor(AtomPattern::element(Element::O)));
        let r = rule("c-back", Element::C, p);
        assert!(matches(MatchContext::new(&g), 0, &r));
    }

    #[test]
    fn nested_slots_cannot_revisit_the_root() {
        let g = graph_of(&make_ethanol());
        // C1's only carbon neighbor is the root itself.
        let back_to_root = rule(
            "cc-c",
            Element::C,
            AtomPattern::any().neighbor(AtomPattern::element(Element::C).neighbor(AtomPattern::element(Element::C))),
        );
        assert!(!matches(MatchContext::new(&g), 0, &back_to_root));
    }

    #[test]
    fn matching_on_a_long_chain_only_walks_the_pattern() {
        let mut sys = System::new();
        let n = 20_000;
        for _ in 0..n {
            sys.add_atom(Atom::new(Element::C));
        }
        for i in 1..n {
            sys.add_bond(i - 1, i, BondOrder::Single);
        }
        let g = graph_of(&sys);
        let interior = rule(
            "c-mid",
            Element::C,
            AtomPattern::any()
                .neighbor(AtomPattern::element(Element::C).with_degree(2))
                .neighbor(AtomPattern::element(Element::C).with_degree(2))
                .exhaustive(),
        );
        let ctx = MatchContext::new(&g);
        let hits = (0..n).filter(|&atom| matches(ctx, atom, &interior)).count();
        assert_eq!(hits, n - 4);
    }

    #[test]
    fn exhaustive_pattern_requires_full_neighbor_set() {
        let g = graph_of(&make_ethanol());
        let hydroxyl = rule(
            "oh",
            Element::O,
            AtomPattern::any()
                .neighbor(AtomPattern::element(Element::H))
                .neighbor(AtomPattern::element(Element::C))
                .exhaustive(),
        );
        let only_h = rule(
            "o-h-only",
            Element::O,
            AtomPattern::any().neighbor(AtomPattern::element(Element::H)).exhaustive(),
        );
        let ctx = MatchContext::new(&g);
        assert!(matches(ctx, 2, &hydroxyl));
        assert!(!matches(ctx, 2, &only_h));
    }

    #[test]
    fn ring_closure_must_return_to_labelled_atom() {
        let g = graph_of(&make_benzene());
        let mut tail = AtomPattern::element(Element::C).closure("r");
        for _ in 0..4 {
            tail = AtomPattern::element(Element::C).neighbor(tail);
        }
        let six_ring = rule("c6", Element::C, AtomPattern::any().labelled("r").neighbor(tail));
        let ctx = MatchContext::new(&g);
        for atom in 0..6 {
            assert!(matches(ctx, atom, &six_ring));
        }

        // A five-membered closure cannot close on a six-ring.
        let mut tail = AtomPattern::element(Element::C).closure("r");
        for _ in 0..3 {
            tail = AtomPattern::element(Element::C).neighbor(tail);
        }
        let five_ring = rule("c5", Element::C, AtomPattern::any().labelled("r").neighbor(tail));
        assert!(!matches(ctx, 0, &five_ring));
    }

    #[test]
    fn aromatic_bond_constraint_uses_perception() {
        let g = graph_of(&make_benzene());
        let r = rule(
            "ca",
            Element::C,
            AtomPattern::any()
                .neighbor_via(BondConstraint::Order(BondOrder::Aromatic), AtomPattern::element(Element::C))
                .neighbor_via(BondConstraint::Order(BondOrder::Single), AtomPattern::element(Element::H)),
        );
        assert!(matches(MatchContext::new(&g), 0, &r));
    }

    #[test]
    fn type_references_need_candidates() {
        let g = graph_of(&make_benzene());
        let ha = rule(
            "ha",
            Element::H,
            AtomPattern::any().neighbor(AtomPattern::element(Element::C).with_type("ca")),
        );
        assert!(!matches(MatchContext::new(&g), 6, &ha));

        let mut candidates = vec![BTreeSet::new(); g.atom_count()];
        candidates[0].insert("ca".to_string());
        let ctx = MatchContext::new(&g).with_candidates(&candidates);
        assert!(matches(ctx, 6, &ha));
        assert!(!matches(ctx, 7, &ha));
    }

    #[test]
    fn charge_and_ring_size_constraints() {
        let mut sys = System::new();
        sys.add_atom(Atom::new(Element::N).with_charge(1));
        for _ in 0..4 {
            sys.add_atom(Atom::new(Element::H));
        }
        for h in 1..5 {
            sys.add_bond(0, h, BondOrder::Single);
        }
        let g = graph_of(&sys);
        let ammonium = rule("n4", Element::N, AtomPattern::any().with_charge(1));
        let neutral = rule("n3", Element::N, AtomPattern::any().with_charge(0));
        let ringed = rule("nr", Element::N, AtomPattern::any().with_ring_size(6));
        let ctx = MatchContext::new(&g);
        assert!(matches(ctx, 0, &ammonium));
        assert!(!matches(ctx, 0, &neutral));
        assert!(!matches(ctx, 0, &ringed));
    }
}
