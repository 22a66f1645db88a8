use typeforge::io::{builtin_forcefield, parse_forcefield, parse_structure};
use typeforge::{
    Atom, BondOrder, CancelFlag, Element, ErrorPolicy, ForgeConfig, ForgeError, Forcefield,
    ParametrizationError, ParametrizedTopology, System, TermKind, TypingError, apply,
};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn gaff_lite() -> Forcefield {
    builtin_forcefield("gaff-lite").unwrap()
}

fn add_hydrogens(system: &mut System, heavy: usize, count: usize) {
    for _ in 0..count {
        let h = system.add_atom(Atom::new(Element::H));
        system.add_bond(heavy, h, BondOrder::Single);
    }
}

/// Ring carbons 0..6, hydrogens 6..12.
fn benzene() -> System {
    let mut system = System::new();
    for _ in 0..6 {
        system.add_atom(Atom::new(Element::C));
    }
    for i in 0..6 {
        system.add_bond(i, (i + 1) % 6, BondOrder::Aromatic);
    }
    for i in 0..6 {
        add_hydrogens(&mut system, i, 1);
    }
    system
}

/// Ring carbons 0..6, methyl carbon 6, then hydrogens.
fn toluene() -> System {
    let mut system = System::new();
    for _ in 0..7 {
        system.add_atom(Atom::new(Element::C));
    }
    for i in 0..6 {
        system.add_bond(i, (i + 1) % 6, BondOrder::Aromatic);
    }
    system.add_bond(0, 6, BondOrder::Single);
    for i in 1..6 {
        add_hydrogens(&mut system, i, 1);
    }
    add_hydrogens(&mut system, 6, 3);
    system
}

/// C0 (methyl), C1 (carbinol), O2, H3 on oxygen, H4..H6 on C0, H7..H8 on C1.
fn ethanol() -> System {
    let mut system = System::new();
    let c0 = system.add_atom(Atom::new(Element::C));
    let c1 = system.add_atom(Atom::new(Element::C));
    let o = system.add_atom(Atom::new(Element::O));
    system.add_bond(c0, c1, BondOrder::Single);
    system.add_bond(c1, o, BondOrder::Single);
    add_hydrogens(&mut system, o, 1);
    add_hydrogens(&mut system, c0, 3);
    add_hydrogens(&mut system, c1, 2);
    system
}

/// C0 (methyl), C1 (carbonyl), O2, H3 on C1, H4..H6 on C0.
fn acetaldehyde() -> System {
    let mut system = System::new();
    let c0 = system.add_atom(Atom::new(Element::C));
    let c1 = system.add_atom(Atom::new(Element::C));
    let o = system.add_atom(Atom::new(Element::O));
    system.add_bond(c0, c1, BondOrder::Single);
    system.add_bond(c1, o, BondOrder::Double);
    add_hydrogens(&mut system, c1, 1);
    add_hydrogens(&mut system, c0, 3);
    system
}

fn assigned_types(topology: &ParametrizedTopology) -> Vec<&str> {
    (0..topology.graph.atom_count())
        .map(|i| topology.graph.assigned_type(i).unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Typing with the bundled force field
// ---------------------------------------------------------------------------

#[test]
fn benzene_types_and_terms() {
    let topology = apply(&benzene(), &gaff_lite(), &ForgeConfig::default()).unwrap();

    assert_eq!(topology.forcefield, "gaff-lite");
    assert_eq!(topology.count_type("ca"), 6);
    assert_eq!(topology.count_type("ha"), 6);
    assert_eq!(topology.atom_types(), vec!["ca", "ha"]);

    assert_eq!(topology.bonds.len(), 12);
    assert_eq!(topology.angles.len(), 18);
    assert_eq!(topology.dihedrals.len(), 24);
    assert_eq!(topology.impropers.len(), 6);
    assert_eq!(topology.periodic_torsions().count(), 30);
    assert!(topology.is_complete());
}

#[test]
fn benzene_impropers_place_the_center_third() {
    let topology = apply(&benzene(), &gaff_lite(), &ForgeConfig::default()).unwrap();

    let mut centers: Vec<usize> = topology.impropers.iter().map(|imp| imp.atoms[2]).collect();
    centers.sort_unstable();
    assert_eq!(centers, vec![0, 1, 2, 3, 4, 5]);

    for improper in &topology.impropers {
        let [a, b, center, d] = improper.atoms;
        assert_eq!(improper.key[0], "ca");
        for other in [a, b, d] {
            assert!(topology.graph.is_bonded(center, other));
        }
    }
}

#[test]
fn ethanol_types_follow_overrides() {
    let topology = apply(&ethanol(), &gaff_lite(), &ForgeConfig::default()).unwrap();

    assert_eq!(
        assigned_types(&topology),
        vec!["c3", "c3", "oh", "ho", "hc", "hc", "hc", "h1", "h1"]
    );
    assert_eq!(topology.bonds.len(), 8);
    assert_eq!(topology.angles.len(), 13);
    assert_eq!(topology.dihedrals.len(), 12);
    assert!(topology.impropers.is_empty());
}

#[test]
fn carbonyl_rule_overrides_sp2_carbon() {
    let config = ForgeConfig::default().with_best_effort(true);
    let topology = apply(&acetaldehyde(), &gaff_lite(), &config).unwrap();

    assert_eq!(assigned_types(&topology), vec!["c3", "c", "o", "hc", "hc", "hc", "hc"]);
}

#[test]
fn atom_without_a_rule_is_named() {
    let mut system = System::new();
    let c = system.add_atom(Atom::new(Element::C));
    let cl = system.add_atom(Atom::new(Element::Cl));
    system.add_bond(c, cl, BondOrder::Single);
    add_hydrogens(&mut system, c, 3);

    let err = apply(&system, &gaff_lite(), &ForgeConfig::default()).unwrap_err();
    assert_eq!(
        err.typing_errors(),
        &[TypingError::NoMatchingRule {
            atom: 1,
            element: Element::Cl,
        }]
    );
    assert!(err.to_string().contains("atom 1 (Cl)"));
}

// ---------------------------------------------------------------------------
// 2. Parameter lookup
// ---------------------------------------------------------------------------

#[test]
fn exact_key_beats_wildcard() {
    let mut system = System::new();
    let c0 = system.add_atom(Atom::new(Element::C));
    let c1 = system.add_atom(Atom::new(Element::C));
    system.add_bond(c0, c1, BondOrder::Single);
    add_hydrogens(&mut system, c0, 3);
    add_hydrogens(&mut system, c1, 3);

    let topology = apply(&system, &gaff_lite(), &ForgeConfig::default()).unwrap();
    assert_eq!(topology.dihedrals.len(), 9);
    for dihedral in &topology.dihedrals {
        assert_eq!(dihedral.key, ["hc", "c3", "c3", "hc"]);
    }
}

#[test]
fn wildcard_fallback_records_the_matched_key() {
    let topology = apply(&ethanol(), &gaff_lite(), &ForgeConfig::default()).unwrap();

    // H4-C0-C1-O2 has no exact entry.
    let term = topology
        .dihedrals
        .iter()
        .find(|d| d.atoms == [4, 0, 1, 2] || d.atoms == [2, 1, 0, 4])
        .unwrap();
    assert_eq!(term.key, ["*", "c3", "c3", "*"]);

    // Every ethanol torsion resolves through a wildcard entry.
    let wildcard_hits = topology
        .dihedrals
        .iter()
        .filter(|d| d.key.iter().any(|t| t == "*"))
        .count();
    assert_eq!(wildcard_hits, 12);
}

#[test]
fn missing_parameter_fails_the_run() {
    let err = apply(&acetaldehyde(), &gaff_lite(), &ForgeConfig::default()).unwrap_err();

    match err.parametrization_errors() {
        [ParametrizationError::MissingParameter(term)] => {
            assert_eq!(term.kind, TermKind::Angle);
            assert_eq!(term.atoms, vec![0, 1, 3]);
            assert_eq!(term.types, vec!["c3", "c", "hc"]);
        }
        other => panic!("unexpected errors: {:?}", other),
    }
}

#[test]
fn best_effort_keeps_the_parametrized_rest() {
    let config = ForgeConfig::default().with_best_effort(true);
    let topology = apply(&acetaldehyde(), &gaff_lite(), &config).unwrap();

    assert!(!topology.is_complete());
    assert_eq!(topology.unparametrized.len(), 1);
    assert_eq!(topology.angles.len(), 8);
    assert_eq!(topology.bonds.len(), 6);
    assert_eq!(topology.dihedrals.len(), 6);
}

// ---------------------------------------------------------------------------
// 3. Ambiguity, error policy, cancellation
// ---------------------------------------------------------------------------

const OVERLAPPING: &str = r#"
name = "overlap"

[[rules]]
id = "ow"
element = "O"
pattern = { degree = 2 }

[[rules]]
id = "ox"
element = "O"
pattern = { degree = 2 }

[[rules]]
id = "hw"
element = "H"
"#;

fn water() -> System {
    let mut system = System::new();
    let o = system.add_atom(Atom::new(Element::O));
    add_hydrogens(&mut system, o, 2);
    system
}

#[test]
fn unresolved_overlap_is_ambiguous() {
    let forcefield = parse_forcefield(OVERLAPPING).unwrap();
    let err = apply(&water(), &forcefield, &ForgeConfig::default()).unwrap_err();

    assert_eq!(
        err.typing_errors(),
        &[TypingError::AmbiguousType {
            atom: 0,
            element: Element::O,
            candidates: vec!["ow".to_string(), "ox".to_string()],
        }]
    );
}

#[test]
fn first_error_policy_reports_one_atom() {
    let mut system = System::new();
    for _ in 0..3 {
        system.add_atom(Atom::new(Element::Cl));
    }

    let collect = apply(&system, &gaff_lite(), &ForgeConfig::default()).unwrap_err();
    assert_eq!(collect.typing_errors().len(), 3);

    let config = ForgeConfig::default().with_error_policy(ErrorPolicy::FirstError);
    let first = apply(&system, &gaff_lite(), &config).unwrap_err();
    assert_eq!(first.typing_errors().len(), 1);
    assert_eq!(first.typing_errors()[0].atom(), 0);
}

#[test]
fn cancelled_run_returns_cancelled() {
    let flag = CancelFlag::new();
    flag.cancel();
    let config = ForgeConfig::default().with_cancel_flag(flag);

    let err = apply(&toluene(), &gaff_lite(), &config).unwrap_err();
    assert!(matches!(err, ForgeError::Cancelled));
}

#[test]
fn parallel_and_serial_runs_agree() {
    let forcefield = gaff_lite();
    for system in [toluene(), ethanol(), benzene()] {
        let parallel = apply(&system, &forcefield, &ForgeConfig::default()).unwrap();
        let serial = apply(&system, &forcefield, &ForgeConfig::default().with_parallel(false)).unwrap();

        assert_eq!(assigned_types(&parallel), assigned_types(&serial));
        assert_eq!(parallel.bonds, serial.bonds);
        assert_eq!(parallel.angles, serial.angles);
        assert_eq!(parallel.dihedrals, serial.dihedrals);
        assert_eq!(parallel.impropers, serial.impropers);
    }
}

#[test]
fn toluene_is_fully_parametrized() {
    let topology = apply(&toluene(), &gaff_lite(), &ForgeConfig::default()).unwrap();

    assert_eq!(topology.count_type("ca"), 6);
    assert_eq!(topology.count_type("c3"), 1);
    assert_eq!(topology.count_type("ha"), 5);
    assert_eq!(topology.count_type("hc"), 3);
    assert!(topology.is_complete());
}

// ---------------------------------------------------------------------------
// 4. Structure files
// ---------------------------------------------------------------------------

#[test]
fn structure_file_end_to_end() {
    let system = parse_structure(
        r#"
name = "water"

[[atoms]]
element = "O"

[[atoms]]
element = "H"

[[atoms]]
element = "H"

[[bonds]]
atoms = [0, 1]

[[bonds]]
atoms = [0, 2]
order = "single"
"#,
    )
    .unwrap();

    let topology = apply(&system, &gaff_lite(), &ForgeConfig::default()).unwrap();
    assert_eq!(assigned_types(&topology), vec!["oh", "ho", "ho"]);
    assert_eq!(topology.bonds.len(), 2);
    assert_eq!(topology.angles.len(), 1);
    assert_eq!(topology.angles[0].key, ["ho", "oh", "ho"]);
    assert!(topology.dihedrals.is_empty());
}
